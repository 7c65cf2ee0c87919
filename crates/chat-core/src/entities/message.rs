//! Message entity - one entry of the conversation timeline

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::kind::MessageKind;
use super::reaction::{self, Reaction, ReactionChange};
use super::reply::Reply;
use crate::error::DomainError;
use crate::value_objects::{MessageId, UserId};

/// Delivery status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageStatus {
    /// Handed to the transport (or received)
    #[default]
    Sent,
    /// Reached the peer's client
    Delivered,
    /// Seen by the peer
    Read,
    /// The transport refused it or the server rejected it
    Failed,
}

impl MessageStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }

    /// Parse a wire status; unknown values read as `Sent`
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "delivered" => Self::Delivered,
            "read" => Self::Read,
            "failed" => Self::Failed,
            _ => Self::Sent,
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Failed | Self::Sent => 0,
            Self::Delivered => 1,
            Self::Read => 2,
        }
    }

    /// Combine the local status with one reported for the same message
    ///
    /// A failure report always wins. Otherwise a confirmation clears a local
    /// failure and the status only moves forward (sent, delivered, read).
    #[must_use]
    pub fn reconcile(self, reported: Self) -> Self {
        match (self, reported) {
            (_, Self::Failed) => Self::Failed,
            (Self::Failed, other) => other,
            (local, other) if other.rank() > local.rank() => other,
            (local, _) => local,
        }
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    /// Set by the originating client so echoes can be matched to the optimistic copy
    pub correlation_id: Option<Uuid>,
    pub sender_id: UserId,
    pub sender_name: String,
    pub recipient_id: Option<UserId>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    pub status: MessageStatus,
    pub reactions: Vec<Reaction>,
    pub replies: Vec<Reply>,
    pub is_pinned: bool,
}

impl Message {
    /// Create a new Message with empty reactions and replies
    pub fn new(
        id: MessageId,
        sender_id: UserId,
        sender_name: String,
        content: String,
        kind: MessageKind,
    ) -> Self {
        Self {
            id,
            correlation_id: None,
            sender_id,
            sender_name,
            recipient_id: None,
            content,
            timestamp: Utc::now(),
            kind,
            status: MessageStatus::Sent,
            reactions: Vec::new(),
            replies: Vec::new(),
            is_pinned: false,
        }
    }

    /// Attach a correlation id
    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Attach the recipient
    pub fn with_recipient(mut self, recipient_id: UserId) -> Self {
        self.recipient_id = Some(recipient_id);
        self
    }

    /// Override the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Check if the message was sent by `user`
    #[inline]
    pub fn is_from(&self, user: &UserId) -> bool {
        &self.sender_id == user
    }

    /// Check if the message has failed to send
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.status == MessageStatus::Failed
    }

    /// Get a truncated preview of the message (for notifications)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }

    /// Validate content and payload before the message leaves this client
    pub fn validate(&self, max_content_len: usize) -> Result<(), DomainError> {
        if self.id.is_empty() {
            return Err(DomainError::InvalidMessageId);
        }
        if self.kind.has_authored_content() {
            if self.content.trim().is_empty() {
                return Err(DomainError::EmptyContent);
            }
            if self.content.chars().count() > max_content_len {
                return Err(DomainError::ContentTooLong {
                    max: max_content_len,
                });
            }
        }
        self.kind.validate_payload()
    }

    /// Get the reaction entry for an emoji
    pub fn reaction(&self, emoji: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.emoji == emoji)
    }

    /// Toggle `user`'s reaction (see [`reaction::toggle`])
    pub fn toggle_reaction(&mut self, emoji: &str, user: &UserId) -> ReactionChange {
        reaction::toggle(&mut self.reactions, emoji, user)
    }

    /// Set `user`'s reaction state (see [`reaction::set_membership`])
    pub fn set_reaction(
        &mut self,
        emoji: &str,
        user: &UserId,
        active: bool,
        local_user: &UserId,
    ) -> bool {
        reaction::set_membership(&mut self.reactions, emoji, user, active, local_user)
    }

    /// Total number of reactions on this message
    pub fn reaction_count(&self) -> usize {
        reaction::total(&self.reactions)
    }

    /// Append a reply unless one with the same id is already present
    pub fn push_reply(&mut self, reply: Reply) -> bool {
        if self.replies.iter().any(|r| r.id == reply.id) {
            return false;
        }
        self.replies.push(reply);
        true
    }
}
