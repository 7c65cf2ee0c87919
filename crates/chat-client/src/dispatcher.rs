//! Outbound dispatcher
//!
//! Builds validated envelopes for everything the local user sends.

use crate::protocol::{ClientCommand, MessagePayload, SendMessagePayload};
use chat_core::{
    Attachment, DomainError, Message, MessageId, MessageKind, Reply, SnowflakeGenerator, UserId,
    VoiceClip,
};
use uuid::Uuid;

/// Content label of a voice message
pub const VOICE_LABEL: &str = "Voice message";
/// Content label of an image message
pub const IMAGE_LABEL: &str = "Image";

/// What the local user wants to send, as handed over by an input collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingContent {
    Text(String),
    Sticker(String),
    Voice(VoiceClip),
    File(Attachment),
    Image(Attachment),
}

impl OutgoingContent {
    /// Typed text; surrounding whitespace is trimmed
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into().trim().to_string())
    }

    pub fn sticker(sticker: impl Into<String>) -> Self {
        Self::Sticker(sticker.into())
    }

    /// Recorded clip from the voice-capture collaborator
    pub fn voice(duration: f64, waveform: Vec<f32>) -> Self {
        Self::Voice(VoiceClip { duration, waveform })
    }

    pub fn file(url: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self::File(Attachment {
            url: url.into(),
            name: name.into(),
            size,
        })
    }

    pub fn image(url: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self::Image(Attachment {
            url: url.into(),
            name: name.into(),
            size,
        })
    }

    /// Split into the content string and the message kind
    ///
    /// Media messages get a label as content: files show their name.
    pub fn into_parts(self) -> (String, MessageKind) {
        match self {
            Self::Text(content) => (content, MessageKind::Text),
            Self::Sticker(sticker) => (sticker, MessageKind::Sticker),
            Self::Voice(clip) => (VOICE_LABEL.to_string(), MessageKind::Voice(clip)),
            Self::File(attachment) => (attachment.name.clone(), MessageKind::File(attachment)),
            Self::Image(attachment) => (IMAGE_LABEL.to_string(), MessageKind::Image(attachment)),
        }
    }
}

/// Builds outgoing envelopes
#[derive(Debug)]
pub struct OutboundDispatcher {
    ids: SnowflakeGenerator,
    max_content_len: usize,
}

impl OutboundDispatcher {
    #[must_use]
    pub fn new(ids: SnowflakeGenerator, max_content_len: usize) -> Self {
        Self {
            ids,
            max_content_len,
        }
    }

    /// Generate a fresh local id
    pub fn next_id(&mut self) -> MessageId {
        MessageId::from(self.ids.generate())
    }

    /// Build a message from `sender` to `recipient`
    ///
    /// The envelope gets a local id and a correlation id, `sent` status, and
    /// no reactions, replies, or pin.
    pub fn envelope(
        &mut self,
        sender: &UserId,
        sender_name: &str,
        recipient: &UserId,
        content: OutgoingContent,
    ) -> Result<Message, DomainError> {
        let (content, kind) = content.into_parts();
        let message = Message::new(
            self.next_id(),
            sender.clone(),
            sender_name.to_string(),
            content,
            kind,
        )
        .with_correlation(Uuid::new_v4())
        .with_recipient(recipient.clone());

        message.validate(self.max_content_len)?;
        Ok(message)
    }

    /// Build a fresh copy of `original` for another recipient
    pub fn forward_copy(
        &mut self,
        original: &Message,
        sender: &UserId,
        sender_name: &str,
        recipient: &UserId,
    ) -> Message {
        Message::new(
            self.next_id(),
            sender.clone(),
            sender_name.to_string(),
            original.content.clone(),
            original.kind.clone(),
        )
        .with_correlation(Uuid::new_v4())
        .with_recipient(recipient.clone())
    }

    /// Build a thread reply
    pub fn reply(
        &mut self,
        sender: &UserId,
        sender_name: &str,
        content: &str,
    ) -> Result<Reply, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::EmptyContent);
        }
        if content.chars().count() > self.max_content_len {
            return Err(DomainError::ContentTooLong {
                max: self.max_content_len,
            });
        }

        Ok(Reply::new(
            self.next_id(),
            sender.clone(),
            sender_name.to_string(),
            content.to_string(),
        ))
    }

    /// Wrap an envelope in a `send-message` frame
    #[must_use]
    pub fn send_command(message: &Message, recipient: &UserId) -> ClientCommand {
        ClientCommand::SendMessage(SendMessagePayload {
            message: MessagePayload::from_message(message),
            recipient_id: recipient.clone(),
        })
    }
}
