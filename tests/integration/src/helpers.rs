//! Test helpers for integration tests
//!
//! Provides a logged-in client wired to an in-memory server, plus shortcuts
//! for the server's half of common exchanges.

use std::sync::Arc;

use anyhow::{bail, Result};
use chat_client::connection::testing::{MemoryConnector, MemoryServer};
use chat_client::protocol::{ClientCommand, HistoryPayload, MessagePayload, ServerEvent};
use chat_client::{ChatClient, ClientEvent, RoomState, SessionToken};
use chat_common::ClientConfig;
use chat_core::UserId;
use tokio::sync::broadcast;

/// Configuration used by every test session
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::for_server("ws://chat.test/ws");
    config.snowflake.worker_id = Some(1);
    config
}

/// A client logged in against an in-memory server
pub struct TestSession {
    pub client: ChatClient,
    pub server: MemoryServer,
}

impl TestSession {
    /// Log `user` in with the default test configuration
    pub async fn start(user: &str) -> Result<Self> {
        Self::start_with_config(user, test_config()).await
    }

    /// Log `user` in with a custom configuration
    pub async fn start_with_config(user: &str, config: ClientConfig) -> Result<Self> {
        let (connector, server) = MemoryConnector::pair();
        let mut client = ChatClient::new(config, Arc::new(connector));
        client.login(UserId::new(user), display_name(user)).await?;

        Ok(Self { client, server })
    }

    /// Select `peer` and answer the history request with `messages`
    pub async fn open_room(&mut self, peer: &str, messages: Vec<MessagePayload>) -> Result<SessionToken> {
        let token = self.client.select_peer(UserId::new(peer))?;
        self.server.take_commands();
        self.deliver(ServerEvent::ChatHistory(HistoryPayload {
            messages,
            request_id: Some(token.value()),
        }))
        .await?;

        if self.client.room_state() != Some(&RoomState::Ready) {
            bail!("room with {peer} did not become ready: {:?}", self.client.room_state());
        }
        Ok(token)
    }

    /// Push a server event and let the client apply it
    pub async fn deliver(&mut self, event: ServerEvent) -> Result<()> {
        if !self.server.push(event) {
            bail!("no open link to deliver on");
        }
        self.client.process_next().await;
        Ok(())
    }

    /// Drain what the client sent since the last call
    pub fn sent(&self) -> Vec<ClientCommand> {
        self.server.take_commands()
    }

    /// Payloads of the `send-message` frames sent since the last call
    pub fn sent_messages(&self) -> Vec<MessagePayload> {
        self.sent()
            .into_iter()
            .filter_map(|command| match command {
                ClientCommand::SendMessage(payload) => Some(payload.message),
                _ => None,
            })
            .collect()
    }
}

/// Collect the notifications published so far
pub fn drain(events: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Display name derived from a user id
pub fn display_name(user: &str) -> String {
    let mut chars = user.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
