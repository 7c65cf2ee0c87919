//! Test fixtures and data generators
//!
//! Wire-format messages and events as the chat server would send them.

use std::sync::atomic::{AtomicU64, Ordering};

use chat_client::protocol::{
    MessagePayload, ReactionUpdatePayload, ReceivePayload, RoomPayload, ServerEvent,
};
use chat_core::{MessageId, UserId};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Counter for unique server-assigned ids
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique server message id
pub fn server_id() -> MessageId {
    MessageId::new(format!("srv-{}", COUNTER.fetch_add(1, Ordering::SeqCst)))
}

/// A text message between two users, as stored by the server
pub fn text_message(sender: &str, recipient: &str, content: &str) -> MessagePayload {
    wire_message(json!({
        "id": server_id(),
        "senderId": sender,
        "senderName": sender,
        "recipientId": recipient,
        "content": content,
        "type": "text",
        "status": "delivered",
    }))
}

/// A text message sent at a fixed instant
pub fn text_message_at(sender: &str, recipient: &str, content: &str, at: DateTime<Utc>) -> MessagePayload {
    let mut message = text_message(sender, recipient, content);
    message.timestamp = at;
    message
}

/// A voice message with a short waveform
pub fn voice_message(sender: &str, recipient: &str, duration: f64) -> MessagePayload {
    wire_message(json!({
        "id": server_id(),
        "senderId": sender,
        "senderName": sender,
        "recipientId": recipient,
        "content": "Voice message",
        "type": "voice",
        "duration": duration,
        "waveform": [0.1, 0.6, 0.3],
    }))
}

fn wire_message(value: serde_json::Value) -> MessagePayload {
    match serde_json::from_value(value) {
        Ok(message) => message,
        Err(e) => panic!("fixture is not a valid message payload: {e}"),
    }
}

/// `receive-message` carrying `message`
pub fn receive(message: MessagePayload) -> ServerEvent {
    ServerEvent::ReceiveMessage(ReceivePayload { message })
}

/// `reaction-update` from `user`
pub fn reaction(message_id: &MessageId, emoji: &str, user: &str, recipient: &str, active: bool) -> ServerEvent {
    ServerEvent::ReactionUpdate(ReactionUpdatePayload {
        message_id: message_id.clone(),
        emoji: emoji.to_string(),
        user_id: UserId::new(user),
        recipient_id: Some(UserId::new(recipient)),
        active,
    })
}

/// `typing-start` from `user` to `recipient`
pub fn typing_start(user: &str, recipient: &str) -> ServerEvent {
    ServerEvent::TypingStart(RoomPayload::new(&UserId::new(user), &UserId::new(recipient)))
}
