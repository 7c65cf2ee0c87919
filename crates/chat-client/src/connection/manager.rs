//! Connection manager
//!
//! Owns the single link to the chat server and its reconnection schedule.

use super::{ConnectionState, Connector, TransportError, TransportEvent, TransportHandle};
use crate::protocol::ClientCommand;
use chat_common::{ClientError, ReconnectConfig};
use chat_core::UserId;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::Instant;

/// Manages the one connection of a logged-in user
///
/// A lost link is retried with exponential backoff; the caller drives the
/// schedule through [`ConnectionManager::reconnect_if_due`].
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    policy: ReconnectConfig,
    state: ConnectionState,

    /// User the link is opened for (None after logout)
    user: Option<UserId>,

    outbound: Option<mpsc::Sender<ClientCommand>>,
    inbound: Option<mpsc::Receiver<TransportEvent>>,

    /// When the next reconnection attempt is due
    retry_at: Option<Instant>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, policy: ReconnectConfig) -> Self {
        Self {
            connector,
            policy,
            state: ConnectionState::Disconnected,
            user: None,
            outbound: None,
            inbound: None,
            retry_at: None,
        }
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if the link is up
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// When the next reconnection attempt is due, if one is scheduled
    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Open the link for `user`
    ///
    /// On failure the first reconnection attempt is scheduled and the error
    /// is returned for logging; the manager keeps trying on its own.
    pub async fn connect(&mut self, user: &UserId) -> Result<(), TransportError> {
        self.close_link();
        self.user = Some(user.clone());
        self.state = ConnectionState::Connecting;

        match self.connector.connect(user).await {
            Ok(handle) => {
                self.install(handle);
                tracing::info!(user_id = %user, "Connected to chat server");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id = %user, error = %e, "Connection failed");
                self.schedule_retry(1, Instant::now());
                Err(e)
            }
        }
    }

    /// Drop the link and stop reconnecting
    pub fn disconnect(&mut self) {
        self.close_link();
        self.user = None;
        self.retry_at = None;
        self.state = ConnectionState::Disconnected;
        tracing::debug!("Disconnected");
    }

    /// Record that the link went away and schedule the first reconnection
    pub fn handle_closed(&mut self, reason: &str, now: Instant) {
        self.close_link();
        tracing::warn!(reason = %reason, "Connection lost");

        if self.user.is_some() {
            self.schedule_retry(1, now);
        } else {
            self.state = ConnectionState::Disconnected;
        }
    }

    /// Attempt a reconnection if one is due at `now`
    ///
    /// Returns `true` if the link came back up. The schedule is only cleared
    /// once the attempt finishes, so a cancelled attempt is simply retried.
    pub async fn reconnect_if_due(&mut self, now: Instant) -> bool {
        let Some(due) = self.retry_at else {
            return false;
        };
        if due > now {
            return false;
        }
        let (ConnectionState::Reconnecting { attempt }, Some(user)) = (self.state, self.user.clone())
        else {
            self.retry_at = None;
            return false;
        };

        tracing::debug!(user_id = %user, attempt, "Reconnecting");
        let result = self.connector.connect(&user).await;
        self.retry_at = None;

        match result {
            Ok(handle) => {
                self.install(handle);
                tracing::info!(user_id = %user, attempt, "Reconnected to chat server");
                true
            }
            Err(e) => {
                tracing::warn!(user_id = %user, attempt, error = %e, "Reconnection failed");
                self.schedule_retry(attempt + 1, now);
                false
            }
        }
    }

    /// Queue a frame for the server
    ///
    /// Never waits: a full queue is reported as a send failure.
    pub fn send(&self, command: ClientCommand) -> Result<(), ClientError> {
        let Some(outbound) = &self.outbound else {
            return Err(ClientError::NotConnected);
        };

        let event = command.event_type();
        match outbound.try_send(command) {
            Ok(()) => {
                tracing::trace!(event = %event, "Frame queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                Err(ClientError::SendFailure("outbound queue is full".to_string()))
            }
            Err(TrySendError::Closed(_)) => Err(ClientError::NotConnected),
        }
    }

    /// Wait for the next event from the link
    ///
    /// Pends forever while there is no link. Cancellation safe.
    pub async fn next_event(&mut self) -> TransportEvent {
        match self.inbound.as_mut() {
            Some(inbound) => inbound.recv().await.unwrap_or_else(|| TransportEvent::Closed {
                reason: "transport channel closed".to_string(),
            }),
            None => std::future::pending().await,
        }
    }

    fn install(&mut self, handle: TransportHandle) {
        self.outbound = Some(handle.outbound);
        self.inbound = Some(handle.inbound);
        self.retry_at = None;
        self.state = ConnectionState::Connected;
    }

    fn close_link(&mut self) {
        self.outbound = None;
        self.inbound = None;
    }

    fn schedule_retry(&mut self, attempt: u32, now: Instant) {
        if self.policy.allows(attempt) {
            let delay = self.policy.delay_for(attempt);
            self.state = ConnectionState::Reconnecting { attempt };
            self.retry_at = Some(now + delay);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnection scheduled");
        } else {
            self.state = ConnectionState::Disconnected;
            self.retry_at = None;
            tracing::warn!(attempts = attempt - 1, "Giving up on reconnection");
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state)
            .field("user", &self.user)
            .field("retry_at", &self.retry_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::MemoryConnector;
    use crate::protocol::{RoomPayload, ServerEvent};
    use std::time::Duration;

    fn policy(max_attempts: u32) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            max_attempts,
        }
    }

    fn join(user: &str) -> ClientCommand {
        ClientCommand::JoinRoom(RoomPayload::new(&UserId::new(user), &UserId::new("bob")))
    }

    #[tokio::test]
    async fn test_connect_and_send() {
        let (connector, server) = MemoryConnector::pair();
        let mut manager = ConnectionManager::new(Arc::new(connector), policy(0));

        manager.connect(&UserId::new("alice")).await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Connected);

        manager.send(join("alice")).unwrap();
        assert_eq!(server.take_commands(), vec![join("alice")]);
    }

    #[tokio::test]
    async fn test_send_without_link() {
        let (connector, _server) = MemoryConnector::pair();
        let manager = ConnectionManager::new(Arc::new(connector), policy(0));

        assert!(matches!(
            manager.send(join("alice")),
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_failed_connect_schedules_retry() {
        let (connector, server) = MemoryConnector::pair();
        server.refuse_connections(1);
        let mut manager = ConnectionManager::new(Arc::new(connector), policy(0));

        let before = Instant::now();
        assert!(manager.connect(&UserId::new("alice")).await.is_err());
        assert_eq!(manager.state(), ConnectionState::Reconnecting { attempt: 1 });

        let due = manager.retry_at().unwrap();
        assert!(due >= before + Duration::from_millis(100));

        // Not yet due
        assert!(!manager.reconnect_if_due(before).await);
        assert!(manager.reconnect_if_due(due).await);
        assert!(manager.is_connected());
        assert!(manager.retry_at().is_none());
    }

    #[tokio::test]
    async fn test_backoff_grows_between_failures() {
        let (connector, server) = MemoryConnector::pair();
        server.refuse_connections(3);
        let mut manager = ConnectionManager::new(Arc::new(connector), policy(0));

        let _ = manager.connect(&UserId::new("alice")).await;
        let first = manager.retry_at().unwrap();
        assert!(!manager.reconnect_if_due(first).await);
        assert_eq!(manager.state(), ConnectionState::Reconnecting { attempt: 2 });

        let second = manager.retry_at().unwrap();
        assert_eq!(second - first, Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (connector, server) = MemoryConnector::pair();
        server.refuse_connections(10);
        let mut manager = ConnectionManager::new(Arc::new(connector), policy(2));

        let _ = manager.connect(&UserId::new("alice")).await;
        let due = manager.retry_at().unwrap();
        assert!(!manager.reconnect_if_due(due).await);
        let due = manager.retry_at().unwrap();
        assert!(!manager.reconnect_if_due(due).await);

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.retry_at().is_none());
    }

    #[tokio::test]
    async fn test_closed_link_is_reported_and_retried() {
        let (connector, server) = MemoryConnector::pair();
        let mut manager = ConnectionManager::new(Arc::new(connector), policy(0));
        manager.connect(&UserId::new("alice")).await.unwrap();

        server.push(ServerEvent::TypingStart(RoomPayload::new(
            &UserId::new("bob"),
            &UserId::new("alice"),
        )));
        assert!(matches!(manager.next_event().await, TransportEvent::Frame(_)));

        server.drop_link("server restart");
        let event = manager.next_event().await;
        assert_eq!(
            event,
            TransportEvent::Closed {
                reason: "server restart".to_string()
            }
        );

        manager.handle_closed("server restart", Instant::now());
        assert_eq!(manager.state(), ConnectionState::Reconnecting { attempt: 1 });
        assert!(manager.send(join("alice")).is_err());
    }

    #[tokio::test]
    async fn test_disconnect_cancels_retry() {
        let (connector, server) = MemoryConnector::pair();
        server.refuse_connections(1);
        let mut manager = ConnectionManager::new(Arc::new(connector), policy(0));

        let _ = manager.connect(&UserId::new("alice")).await;
        manager.disconnect();

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.retry_at().is_none());
        assert!(!manager.reconnect_if_due(Instant::now() + Duration::from_secs(60)).await);
    }
}
