//! In-memory transport
//!
//! A [`MemoryConnector`] hands out channel-backed links; its paired
//! [`MemoryServer`] plays the chat server: it reads the commands the client
//! queued and pushes events back.

use super::{Connector, TransportError, TransportEvent, TransportHandle};
use crate::protocol::{ClientCommand, ServerEvent};
use async_trait::async_trait;
use chat_core::UserId;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

const LINK_BUFFER: usize = 64;

struct Shared {
    capacity: usize,
    link: Option<ServerLink>,
    refuse: u32,
    connects: u32,
}

struct ServerLink {
    user: UserId,
    commands: Option<mpsc::Receiver<ClientCommand>>,
    events: mpsc::Sender<TransportEvent>,
}

/// Client side of the in-memory transport
#[derive(Clone)]
pub struct MemoryConnector {
    shared: Arc<Mutex<Shared>>,
}

/// Server side of the in-memory transport
#[derive(Clone)]
pub struct MemoryServer {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryConnector {
    /// Create a connector and the server that observes it
    #[must_use]
    pub fn pair() -> (Self, MemoryServer) {
        Self::with_capacity(LINK_BUFFER)
    }

    /// Create a pair whose links queue at most `capacity` commands
    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, MemoryServer) {
        let shared = Arc::new(Mutex::new(Shared {
            capacity: capacity.max(1),
            link: None,
            refuse: 0,
            connects: 0,
        }));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MemoryServer { shared },
        )
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, user: &UserId) -> Result<TransportHandle, TransportError> {
        let mut shared = self.shared.lock();
        shared.connects += 1;

        if shared.refuse > 0 {
            shared.refuse -= 1;
            return Err(TransportError::Connect("connection refused".to_string()));
        }

        let (outbound, commands) = mpsc::channel(shared.capacity);
        let (events, inbound) = mpsc::channel(LINK_BUFFER);
        shared.link = Some(ServerLink {
            user: user.clone(),
            commands: Some(commands),
            events,
        });

        Ok(TransportHandle { outbound, inbound })
    }
}

impl MemoryServer {
    /// Refuse the next `count` connection attempts
    pub fn refuse_connections(&self, count: u32) {
        self.shared.lock().refuse = count;
    }

    /// Number of connection attempts seen so far
    pub fn connect_count(&self) -> u32 {
        self.shared.lock().connects
    }

    /// Check whether a link is open
    pub fn is_connected(&self) -> bool {
        self.shared.lock().link.is_some()
    }

    /// User the current link was opened for
    pub fn connected_user(&self) -> Option<UserId> {
        self.shared.lock().link.as_ref().map(|link| link.user.clone())
    }

    /// Deliver an event to the client
    ///
    /// Returns `false` if there is no link or its buffer is full.
    pub fn push(&self, event: ServerEvent) -> bool {
        let shared = self.shared.lock();
        shared
            .link
            .as_ref()
            .is_some_and(|link| link.events.try_send(TransportEvent::Frame(event)).is_ok())
    }

    /// Drain every command the client has queued
    pub fn take_commands(&self) -> Vec<ClientCommand> {
        let mut shared = self.shared.lock();
        let mut commands = Vec::new();
        if let Some(receiver) = shared.link.as_mut().and_then(|link| link.commands.as_mut()) {
            while let Ok(command) = receiver.try_recv() {
                commands.push(command);
            }
        }
        commands
    }

    /// Stop accepting commands while keeping the link open
    ///
    /// Subsequent client sends fail as if the writer had died.
    pub fn close_inbox(&self) {
        if let Some(link) = self.shared.lock().link.as_mut() {
            link.commands = None;
        }
    }

    /// Close the link, telling the client why
    pub fn drop_link(&self, reason: &str) {
        let link = self.shared.lock().link.take();
        if let Some(link) = link {
            let _ = link.events.try_send(TransportEvent::Closed {
                reason: reason.to_string(),
            });
        }
    }
}

impl std::fmt::Debug for MemoryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("MemoryServer")
            .field("connected", &shared.link.is_some())
            .field("connects", &shared.connects)
            .finish()
    }
}
