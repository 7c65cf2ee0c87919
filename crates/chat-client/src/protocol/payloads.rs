//! Payload definitions
//!
//! The `data` part of each frame. Keys are camelCase on the wire.

use chat_core::{
    Attachment, DomainError, Message, MessageId, MessageKind, MessageStatus, MessageType,
    Reaction, Reply, UserId, VoiceClip,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// A message as it travels on the wire
///
/// The message type is a flat tag with optional media fields; it is converted
/// into a [`MessageKind`] by [`MessagePayload::into_message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: MessageId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    pub sender_id: UserId,

    #[serde(default)]
    pub sender_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<UserId>,

    #[serde(default)]
    pub content: String,

    #[serde(default = "now")]
    pub timestamp: DateTime<Utc>,

    /// Missing means `text`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub reactions: Vec<ReactionPayload>,

    #[serde(default)]
    pub replies: Vec<ReplyPayload>,

    #[serde(default)]
    pub is_pinned: bool,

    // Voice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<Vec<f32>>,

    // File / image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl MessagePayload {
    /// Flatten a domain message for transmission
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        let voice = message.kind.voice();
        let attachment = message.kind.attachment();

        Self {
            id: message.id.clone(),
            correlation_id: message.correlation_id,
            sender_id: message.sender_id.clone(),
            sender_name: message.sender_name.clone(),
            recipient_id: message.recipient_id.clone(),
            content: message.content.clone(),
            timestamp: message.timestamp,
            message_type: Some(message.kind.message_type().as_str().to_string()),
            status: Some(message.status.as_str().to_string()),
            reactions: message.reactions.iter().map(ReactionPayload::from_reaction).collect(),
            replies: message.replies.iter().map(ReplyPayload::from_reply).collect(),
            is_pinned: message.is_pinned,
            duration: voice.map(|v| v.duration),
            waveform: voice.map(|v| v.waveform.clone()),
            file_url: attachment.map(|a| a.url.clone()),
            file_name: attachment.map(|a| a.name.clone()),
            file_size: attachment.map(|a| a.size),
        }
    }

    /// Convert into a domain message as seen by `local_user`
    ///
    /// Only the structure is checked: a known type tag and the media fields
    /// that type requires. Size limits apply to outgoing messages only.
    ///
    /// Reactions are normalized (duplicate users dropped, empty entries
    /// removed, `hasReacted` recomputed) and duplicate reply ids are dropped.
    pub fn into_message(self, local_user: &UserId) -> Result<Message, DomainError> {
        if self.id.is_empty() {
            return Err(DomainError::InvalidMessageId);
        }

        let message_type = match self.message_type.as_deref() {
            None | Some("") => MessageType::Text,
            Some(raw) => MessageType::parse(raw)?,
        };
        let kind = match message_type {
            MessageType::Text => MessageKind::Text,
            MessageType::Sticker => MessageKind::Sticker,
            MessageType::Voice => MessageKind::Voice(VoiceClip {
                duration: self.duration.ok_or(DomainError::MissingField {
                    kind: "voice",
                    field: "duration",
                })?,
                waveform: self.waveform.ok_or(DomainError::MissingField {
                    kind: "voice",
                    field: "waveform",
                })?,
            }),
            MessageType::File | MessageType::Image => {
                let kind_name = message_type.as_str();
                let attachment = Attachment {
                    url: self.file_url.ok_or(DomainError::MissingField {
                        kind: kind_name,
                        field: "fileUrl",
                    })?,
                    name: self.file_name.ok_or(DomainError::MissingField {
                        kind: kind_name,
                        field: "fileName",
                    })?,
                    size: self.file_size.ok_or(DomainError::MissingField {
                        kind: kind_name,
                        field: "fileSize",
                    })?,
                };
                if message_type == MessageType::File {
                    MessageKind::File(attachment)
                } else {
                    MessageKind::Image(attachment)
                }
            }
        };

        let mut message = Message::new(
            self.id,
            self.sender_id,
            self.sender_name,
            self.content,
            kind,
        )
        .with_timestamp(self.timestamp);
        message.correlation_id = self.correlation_id;
        message.recipient_id = self.recipient_id;
        message.status = self
            .status
            .as_deref()
            .map_or(MessageStatus::Sent, MessageStatus::parse_lenient);
        message.is_pinned = self.is_pinned;

        for reaction in self.reactions {
            if message.reaction(&reaction.emoji).is_some() {
                continue;
            }
            if let Some(normalized) = Reaction::from_users(reaction.emoji, reaction.users, local_user)
            {
                message.reactions.push(normalized);
            }
        }
        for reply in self.replies {
            message.push_reply(reply.into_reply());
        }

        Ok(message)
    }
}

/// Reaction entry on the wire
///
/// `count` and `hasReacted` are derived and ignored on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    pub emoji: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub users: Vec<UserId>,
    #[serde(default)]
    pub has_reacted: bool,
}

impl ReactionPayload {
    #[must_use]
    pub fn from_reaction(reaction: &Reaction) -> Self {
        Self {
            emoji: reaction.emoji.clone(),
            count: reaction.count(),
            users: reaction.users().to_vec(),
            has_reacted: reaction.has_reacted(),
        }
    }
}

/// Reply on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPayload {
    pub id: MessageId,
    pub sender_id: UserId,
    #[serde(default)]
    pub sender_name: String,
    pub content: String,
    #[serde(default = "now")]
    pub timestamp: DateTime<Utc>,
}

impl ReplyPayload {
    #[must_use]
    pub fn from_reply(reply: &Reply) -> Self {
        Self {
            id: reply.id.clone(),
            sender_id: reply.sender_id.clone(),
            sender_name: reply.sender_name.clone(),
            content: reply.content.clone(),
            timestamp: reply.timestamp,
        }
    }

    #[must_use]
    pub fn into_reply(self) -> Reply {
        Reply {
            id: self.id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            content: self.content,
            timestamp: self.timestamp,
        }
    }
}

/// `join-room`, `leave-room`, `typing-start`, `typing-stop`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub user_id: UserId,
    pub recipient_id: UserId,
}

impl RoomPayload {
    #[must_use]
    pub fn new(user_id: &UserId, recipient_id: &UserId) -> Self {
        Self {
            user_id: user_id.clone(),
            recipient_id: recipient_id.clone(),
        }
    }
}

/// `get-history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequestPayload {
    pub user_id: UserId,
    pub recipient_id: UserId,
    /// Echoed back in `chat-history` by servers that support it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

/// `chat-history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPayload {
    #[serde(default)]
    pub messages: Vec<MessagePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

/// `receive-message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivePayload {
    pub message: MessagePayload,
}

/// `send-message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub message: MessagePayload,
    pub recipient_id: UserId,
}

/// `reaction-update`
///
/// Carries the resulting membership, not a toggle, so applying it twice is
/// harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionUpdatePayload {
    pub message_id: MessageId,
    pub emoji: String,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<UserId>,
    pub active: bool,
}

/// `reply-update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyUpdatePayload {
    pub parent_id: MessageId,
    pub reply: ReplyPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<UserId>,
}

/// `message-ack`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckPayload {
    pub correlation_id: Uuid,
    /// Server-assigned id, if different from the client's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// `error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}
