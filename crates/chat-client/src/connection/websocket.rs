//! WebSocket transport
//!
//! Connects with `tokio-tungstenite` and runs one reader and one writer task
//! per link. Text frames are decoded here; undecodable frames are logged and
//! dropped.

use super::{Connector, TransportError, TransportEvent, TransportHandle};
use crate::protocol::{ClientCommand, ServerEvent};
use async_trait::async_trait;
use chat_common::ServerConfig;
use chat_core::UserId;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Opens WebSocket links to the chat server
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    buffer: usize,
    connect_timeout: Duration,
}

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

impl WsConnector {
    /// Create a connector for the configured server
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            url: config.url.clone(),
            buffer: config.outbound_buffer.max(1),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Bound the TCP and WebSocket handshake
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Get the server URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, user: &UserId) -> Result<TransportHandle, TransportError> {
        let handshake = tokio_tungstenite::connect_async(self.url.as_str());
        let (stream, _response) = tokio::time::timeout(self.connect_timeout, handshake)
            .await
            .map_err(|_| {
                TransportError::Connect(format!(
                    "handshake timed out after {}ms",
                    self.connect_timeout.as_millis()
                ))
            })??;
        let (mut sink, mut source) = stream.split();

        let (outbound, mut commands) = mpsc::channel::<ClientCommand>(self.buffer);
        let (events, inbound) = mpsc::channel::<TransportEvent>(self.buffer);

        tracing::debug!(url = %self.url, user_id = %user, "WebSocket link opened");

        // Writer: encode commands until the client drops its sender
        tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                let text = match command.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(event = %command.event_type(), error = %e, "Failed to encode frame");
                        continue;
                    }
                };
                if let Err(e) = sink.send(WsMessage::Text(text)).await {
                    tracing::debug!(error = %e, "WebSocket write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader: decode frames until the socket or the client goes away
        tokio::spawn(async move {
            let reason = loop {
                match source.next().await {
                    Some(Ok(message)) => match translate(message) {
                        Inbound::Event(event) => {
                            if events.send(event).await.is_err() {
                                return;
                            }
                        }
                        Inbound::Ignore => {}
                        Inbound::Close(reason) => break reason,
                    },
                    Some(Err(e)) => break e.to_string(),
                    None => break "stream ended".to_string(),
                }
            };
            let _ = events.send(TransportEvent::Closed { reason }).await;
        });

        Ok(TransportHandle { outbound, inbound })
    }
}

#[derive(Debug, PartialEq)]
enum Inbound {
    Event(TransportEvent),
    Ignore,
    Close(String),
}

fn translate(message: WsMessage) -> Inbound {
    match message {
        WsMessage::Text(text) => decode_frame(&text),
        WsMessage::Binary(bytes) => match std::str::from_utf8(&bytes) {
            Ok(text) => decode_frame(text),
            Err(_) => {
                tracing::warn!(len = bytes.len(), "Dropping non-UTF-8 binary frame");
                Inbound::Ignore
            }
        },
        WsMessage::Close(frame) => Inbound::Close(
            frame.map_or_else(|| "closed by server".to_string(), |f| f.reason.to_string()),
        ),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => Inbound::Ignore,
    }
}

fn decode_frame(text: &str) -> Inbound {
    match ServerEvent::from_json(text) {
        Ok(event) => {
            tracing::trace!(event = %event.event_type(), "Frame received");
            Inbound::Event(TransportEvent::Frame(event))
        }
        Err(e) => {
            tracing::warn!(error = %e, len = text.len(), "Dropping undecodable frame");
            Inbound::Ignore
        }
    }
}
