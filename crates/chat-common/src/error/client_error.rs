//! Client error types
//!
//! Unified error handling for the chat client.

use crate::config::ConfigError;
use chat_core::DomainError;
use std::fmt;

/// Client-wide error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    // Transport errors
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not connected to the chat server")]
    NotConnected,

    #[error("Protocol error: {0}")]
    Protocol(String),

    // Room session errors
    #[error("Timed out waiting to join room")]
    JoinTimeout,

    #[error("Failed to load history: {0}")]
    HistoryLoadFailure(String),

    #[error("No active conversation")]
    NoActiveRoom,

    // Delivery errors
    #[error("Failed to send message: {0}")]
    SendFailure(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Get a stable error code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::JoinTimeout => "JOIN_TIMEOUT",
            Self::HistoryLoadFailure(_) => "HISTORY_LOAD_FAILURE",
            Self::NoActiveRoom => "NO_ACTIVE_ROOM",
            Self::SendFailure(_) => "SEND_FAILURE",
            Self::Domain(e) => e.code(),
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Check whether retrying the same operation later may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::NotConnected
                | Self::JoinTimeout
                | Self::HistoryLoadFailure(_)
                | Self::SendFailure(_)
        )
    }

    /// Check whether this error was caused by the caller's input
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::NoActiveRoom | Self::Domain(_))
    }

    /// Create a connection error
    #[must_use]
    pub fn connection(msg: impl fmt::Display) -> Self {
        Self::Connection(msg.to_string())
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(msg: impl fmt::Display) -> Self {
        Self::Protocol(msg.to_string())
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ClientError::JoinTimeout.code(), "JOIN_TIMEOUT");
        assert_eq!(ClientError::NoActiveRoom.code(), "NO_ACTIVE_ROOM");
        assert_eq!(
            ClientError::HistoryLoadFailure("timeout".to_string()).code(),
            "HISTORY_LOAD_FAILURE"
        );
        assert_eq!(ClientError::from(DomainError::EmptyContent).code(), "EMPTY_CONTENT");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::connection("reset by peer").is_transient());
        assert!(ClientError::JoinTimeout.is_transient());
        assert!(!ClientError::NoActiveRoom.is_transient());
        assert!(!ClientError::protocol("bad frame").is_transient());
        assert!(!ClientError::from(DomainError::EmptyContent).is_transient());
    }

    #[test]
    fn test_caller_errors() {
        assert!(ClientError::NoActiveRoom.is_caller_error());
        assert!(ClientError::from(DomainError::EmptyContent).is_caller_error());
        assert!(!ClientError::NotConnected.is_caller_error());
    }

    #[test]
    fn test_display() {
        let err = ClientError::connection("refused");
        assert_eq!(err.to_string(), "Connection error: refused");

        let err = ClientError::from(ConfigError::MissingVar("CHAT_SERVER_URL"));
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: CHAT_SERVER_URL"
        );
    }
}
