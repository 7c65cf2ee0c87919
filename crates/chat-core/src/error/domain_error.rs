//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::MessageId;

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Message content is empty")]
    EmptyContent,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Invalid voice clip: {0}")]
    InvalidVoiceClip(String),

    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),

    #[error("{kind} message is missing field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Invalid message id")]
    InvalidMessageId,
}

impl DomainError {
    /// Get a stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidVoiceClip(_) => "INVALID_VOICE_CLIP",
            Self::InvalidAttachment(_) => "INVALID_ATTACHMENT",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::UnknownMessageType(_) => "UNKNOWN_MESSAGE_TYPE",
            Self::InvalidMessageId => "INVALID_MESSAGE_ID",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MessageNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        !self.is_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::EmptyContent.code(), "EMPTY_CONTENT");
        assert_eq!(
            DomainError::MessageNotFound(MessageId::new("1")).code(),
            "UNKNOWN_MESSAGE"
        );
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::MessageNotFound(MessageId::new("1")).is_not_found());
        assert!(!DomainError::EmptyContent.is_not_found());
        assert!(DomainError::ContentTooLong { max: 10 }.is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::ContentTooLong { max: 2000 };
        assert_eq!(err.to_string(), "Content too long: max 2000 characters");

        let err = DomainError::MissingField {
            kind: "voice",
            field: "duration",
        };
        assert_eq!(err.to_string(), "voice message is missing field `duration`");
    }
}
