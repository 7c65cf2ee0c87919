//! Reply entity - a thread reply owned by its parent message

use chrono::{DateTime, Utc};

use crate::value_objects::{MessageId, UserId};

/// Reply in a message thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Reply {
    /// Create a new Reply stamped with the current time
    pub fn new(id: MessageId, sender_id: UserId, sender_name: String, content: String) -> Self {
        Self {
            id,
            sender_id,
            sender_name,
            content,
            timestamp: Utc::now(),
        }
    }
}
