//! Message kinds - the type tag of a message and the payload each type carries

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::DomainError;

/// Recorded voice clip handed over by the voice-capture collaborator
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct VoiceClip {
    /// Length in seconds
    #[validate(range(min = 0.0, max = 3600.0, message = "duration must be 0-3600 seconds"))]
    pub duration: f64,

    /// Normalized amplitude samples used to draw the clip
    #[validate(length(min = 1, max = 1024, message = "waveform must have 1-1024 samples"))]
    pub waveform: Vec<f32>,
}

/// File or image reference handed over by the file collaborator
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct Attachment {
    #[validate(length(min = 1, max = 2048, message = "file url must be 1-2048 characters"))]
    pub url: String,

    #[validate(length(min = 1, max = 255, message = "file name must be 1-255 characters"))]
    pub name: String,

    /// Size in bytes
    #[validate(range(min = 1, message = "file size must be positive"))]
    pub size: u64,
}

/// Message type tag as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Voice,
    File,
    Image,
    Sticker,
}

impl MessageType {
    /// All message types in display order
    pub const ALL: [MessageType; 5] = [
        Self::Text,
        Self::Voice,
        Self::File,
        Self::Image,
        Self::Sticker,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::File => "file",
            Self::Image => "image",
            Self::Sticker => "sticker",
        }
    }

    /// Parse a wire type tag
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            "file" => Ok(Self::File),
            "image" => Ok(Self::Image),
            "sticker" => Ok(Self::Sticker),
            other => Err(DomainError::UnknownMessageType(other.to_string())),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message type together with its type-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    Text,
    Sticker,
    Voice(VoiceClip),
    File(Attachment),
    Image(Attachment),
}

impl MessageKind {
    /// Get the wire type tag
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Text => MessageType::Text,
            Self::Sticker => MessageType::Sticker,
            Self::Voice(_) => MessageType::Voice,
            Self::File(_) => MessageType::File,
            Self::Image(_) => MessageType::Image,
        }
    }

    /// Get the attachment for file and image messages
    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            Self::File(a) | Self::Image(a) => Some(a),
            _ => None,
        }
    }

    /// Get the voice clip for voice messages
    pub fn voice(&self) -> Option<&VoiceClip> {
        match self {
            Self::Voice(v) => Some(v),
            _ => None,
        }
    }

    /// Check whether the content string is user-authored text
    ///
    /// Voice, file and image messages carry a generated label instead.
    pub fn has_authored_content(&self) -> bool {
        matches!(self, Self::Text | Self::Sticker)
    }

    /// Validate the type-specific payload
    pub fn validate_payload(&self) -> Result<(), DomainError> {
        match self {
            Self::Text | Self::Sticker => Ok(()),
            Self::Voice(clip) => {
                if !clip.duration.is_finite() {
                    return Err(DomainError::InvalidVoiceClip(
                        "duration must be a finite number".to_string(),
                    ));
                }
                clip.validate()
                    .map_err(|e| DomainError::InvalidVoiceClip(e.to_string()))
            }
            Self::File(attachment) | Self::Image(attachment) => attachment
                .validate()
                .map_err(|e| DomainError::InvalidAttachment(e.to_string())),
        }
    }
}
