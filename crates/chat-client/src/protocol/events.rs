//! Event names
//!
//! Every frame on the wire is `{ "event": <name>, "data": <payload> }`.

use std::fmt;

/// Wire event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    // Room lifecycle (client -> server)
    JoinRoom,
    LeaveRoom,
    GetHistory,

    // Messages
    /// Client submits a message for the peer
    SendMessage,
    /// Server replies to `get-history`
    ChatHistory,
    /// Server delivers a message (including the sender's own echo)
    ReceiveMessage,
    /// Server acknowledges or re-statuses a sent message
    MessageAck,

    // Annotations (both directions)
    ReactionUpdate,
    ReplyUpdate,
    TypingStart,
    TypingStop,

    /// Server-side failure report
    Error,
}

impl ChatEventType {
    /// Get the wire name of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JoinRoom => "join-room",
            Self::LeaveRoom => "leave-room",
            Self::GetHistory => "get-history",
            Self::SendMessage => "send-message",
            Self::ChatHistory => "chat-history",
            Self::ReceiveMessage => "receive-message",
            Self::MessageAck => "message-ack",
            Self::ReactionUpdate => "reaction-update",
            Self::ReplyUpdate => "reply-update",
            Self::TypingStart => "typing-start",
            Self::TypingStop => "typing-stop",
            Self::Error => "error",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "join-room" => Some(Self::JoinRoom),
            "leave-room" => Some(Self::LeaveRoom),
            "get-history" => Some(Self::GetHistory),
            "send-message" => Some(Self::SendMessage),
            "chat-history" => Some(Self::ChatHistory),
            "receive-message" => Some(Self::ReceiveMessage),
            "message-ack" => Some(Self::MessageAck),
            "reaction-update" => Some(Self::ReactionUpdate),
            "reply-update" => Some(Self::ReplyUpdate),
            "typing-start" => Some(Self::TypingStart),
            "typing-stop" => Some(Self::TypingStop),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Check if a client may send this event
    #[must_use]
    pub const fn is_client_event(self) -> bool {
        matches!(
            self,
            Self::JoinRoom
                | Self::LeaveRoom
                | Self::GetHistory
                | Self::SendMessage
                | Self::ReactionUpdate
                | Self::ReplyUpdate
                | Self::TypingStart
                | Self::TypingStop
        )
    }

    /// Check if a server may send this event
    #[must_use]
    pub const fn is_server_event(self) -> bool {
        matches!(
            self,
            Self::ChatHistory
                | Self::ReceiveMessage
                | Self::MessageAck
                | Self::ReactionUpdate
                | Self::ReplyUpdate
                | Self::TypingStart
                | Self::TypingStop
                | Self::Error
        )
    }
}

impl fmt::Display for ChatEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ChatEventType; 12] = [
        ChatEventType::JoinRoom,
        ChatEventType::LeaveRoom,
        ChatEventType::GetHistory,
        ChatEventType::SendMessage,
        ChatEventType::ChatHistory,
        ChatEventType::ReceiveMessage,
        ChatEventType::MessageAck,
        ChatEventType::ReactionUpdate,
        ChatEventType::ReplyUpdate,
        ChatEventType::TypingStart,
        ChatEventType::TypingStop,
        ChatEventType::Error,
    ];

    #[test]
    fn test_names_parse_back() {
        for event in ALL {
            assert_eq!(ChatEventType::parse(event.as_str()), Some(event));
        }
        assert_eq!(ChatEventType::parse("MESSAGE_CREATE"), None);
    }

    #[test]
    fn test_direction() {
        assert!(ChatEventType::JoinRoom.is_client_event());
        assert!(!ChatEventType::JoinRoom.is_server_event());
        assert!(ChatEventType::ChatHistory.is_server_event());
        assert!(!ChatEventType::ChatHistory.is_client_event());
        assert!(ChatEventType::ReactionUpdate.is_client_event());
        assert!(ChatEventType::ReactionUpdate.is_server_event());
    }

    #[test]
    fn test_display() {
        assert_eq!(ChatEventType::TypingStop.to_string(), "typing-stop");
    }
}
