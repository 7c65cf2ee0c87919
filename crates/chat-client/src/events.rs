//! Client notifications
//!
//! Everything a UI needs to redraw, published on a broadcast channel.

use crate::connection::ConnectionState;
use crate::protocol::ChatEventType;
use crate::session::{RoomFailure, SessionToken};
use chat_core::{MessageId, UserId};
use tokio::sync::broadcast;

/// Notification published by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    ConnectionChanged(ConnectionState),
    /// A room session started (or restarted) under `token`
    RoomJoined { peer: UserId, token: SessionToken },
    HistoryLoaded { peer: UserId, count: usize },
    RoomFailed { peer: UserId, failure: RoomFailure },
    MessageAppended(MessageId),
    MessageUpdated(MessageId),
    MessageFailed { id: MessageId, reason: String },
    PeerTyping { peer: UserId, active: bool },
    /// A result for an abandoned room session was dropped
    StaleResultDiscarded {
        event: ChatEventType,
        token: Option<SessionToken>,
    },
    ServerError { code: String, message: String },
}

/// Fan-out of [`ClientEvent`]s to any number of subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    /// Default number of undelivered notifications kept per subscriber
    pub const DEFAULT_CAPACITY: usize = 256;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers; nobody listening is fine
    pub fn publish(&self, event: ClientEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No subscribers for client event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(ClientEvent::MessageAppended(MessageId::new("1")));

        assert_eq!(
            first.recv().await.unwrap(),
            ClientEvent::MessageAppended(MessageId::new("1"))
        );
        assert_eq!(
            second.recv().await.unwrap(),
            ClientEvent::MessageAppended(MessageId::new("1"))
        );
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(ClientEvent::ConnectionChanged(ConnectionState::Connected));
    }
}
