//! Transport seam
//!
//! A [`Connector`] opens one link to the chat server and hands back a pair of
//! channels. Frames are already decoded on the inbound side.

use crate::protocol::{ClientCommand, ServerEvent};
use async_trait::async_trait;
use chat_core::UserId;
use tokio::sync::mpsc;

/// Something received from the link
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A decoded server frame
    Frame(ServerEvent),
    /// The link is gone; no further events follow
    Closed { reason: String },
}

/// Both ends of an open link
#[derive(Debug)]
pub struct TransportHandle {
    pub outbound: mpsc::Sender<ClientCommand>,
    pub inbound: mpsc::Receiver<TransportEvent>,
}

/// Opens links to the chat server
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new link on behalf of `user`
    async fn connect(&self, user: &UserId) -> Result<TransportHandle, TransportError>;
}

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Connection closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connect(err.to_string())
    }
}

impl From<TransportError> for chat_common::ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect(reason) => Self::Connection(reason),
            TransportError::Closed => Self::NotConnected,
        }
    }
}
