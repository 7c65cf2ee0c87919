//! Frame format
//!
//! Defines the two directions of traffic as adjacently tagged enums:
//! `{ "event": "<name>", "data": { ... } }`.

use super::{
    AckPayload, ChatEventType, ErrorPayload, HistoryPayload, HistoryRequestPayload,
    ReactionUpdatePayload, ReceivePayload, ReplyUpdatePayload, RoomPayload, SendMessagePayload,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientCommand {
    JoinRoom(RoomPayload),
    LeaveRoom(RoomPayload),
    GetHistory(HistoryRequestPayload),
    SendMessage(SendMessagePayload),
    ReactionUpdate(ReactionUpdatePayload),
    ReplyUpdate(ReplyUpdatePayload),
    TypingStart(RoomPayload),
    TypingStop(RoomPayload),
}

impl ClientCommand {
    #[must_use]
    pub const fn event_type(&self) -> ChatEventType {
        match self {
            Self::JoinRoom(_) => ChatEventType::JoinRoom,
            Self::LeaveRoom(_) => ChatEventType::LeaveRoom,
            Self::GetHistory(_) => ChatEventType::GetHistory,
            Self::SendMessage(_) => ChatEventType::SendMessage,
            Self::ReactionUpdate(_) => ChatEventType::ReactionUpdate,
            Self::ReplyUpdate(_) => ChatEventType::ReplyUpdate,
            Self::TypingStart(_) => ChatEventType::TypingStart,
            Self::TypingStop(_) => ChatEventType::TypingStop,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientCommand({})", self.event_type())
    }
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    ChatHistory(HistoryPayload),
    ReceiveMessage(ReceivePayload),
    MessageAck(AckPayload),
    ReactionUpdate(ReactionUpdatePayload),
    ReplyUpdate(ReplyUpdatePayload),
    TypingStart(RoomPayload),
    TypingStop(RoomPayload),
    Error(ErrorPayload),
}

impl ServerEvent {
    #[must_use]
    pub const fn event_type(&self) -> ChatEventType {
        match self {
            Self::ChatHistory(_) => ChatEventType::ChatHistory,
            Self::ReceiveMessage(_) => ChatEventType::ReceiveMessage,
            Self::MessageAck(_) => ChatEventType::MessageAck,
            Self::ReactionUpdate(_) => ChatEventType::ReactionUpdate,
            Self::ReplyUpdate(_) => ChatEventType::ReplyUpdate,
            Self::TypingStart(_) => ChatEventType::TypingStart,
            Self::TypingStop(_) => ChatEventType::TypingStop,
            Self::Error(_) => ChatEventType::Error,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerEvent({})", self.event_type())
    }
}
