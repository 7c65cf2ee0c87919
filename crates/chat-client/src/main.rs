//! Terminal chat client entry point
//!
//! Run with:
//! ```bash
//! CHAT_SERVER_URL=ws://localhost:8080/ws CHAT_USER=alice CHAT_PEER=bob cargo run -p chat-client
//! ```
//!
//! Every line read from stdin is sent to the peer as a text message.
//! Configuration is loaded from environment variables (and `.env`).

use anyhow::Context;
use chat_client::{ChatClient, ClientEvent, OutgoingContent, WsConnector};
use chat_common::{try_init_tracing_with_config, ClientConfig, TracingConfig};
use chat_core::UserId;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Chat client stopped");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("failed to load configuration")?;

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let user = required_var("CHAT_USER")?;
    let peer = required_var("CHAT_PEER")?;
    let display_name = std::env::var("CHAT_DISPLAY_NAME").unwrap_or_else(|_| user.clone());

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        server = %config.server.url,
        "Configuration loaded"
    );

    let connector =
        Arc::new(WsConnector::new(&config.server).with_connect_timeout(config.timeouts.join_timeout()));
    let mut client = ChatClient::new(config, connector);
    let mut events = client.subscribe();

    client.login(UserId::new(user), display_name).await?;
    client.select_peer(UserId::new(peer))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match client.send(OutgoingContent::text(line)) {
                    Ok(id) => debug!(message_id = %id, "Message queued"),
                    Err(e) => warn!(error = %e, code = e.code(), "Message not sent"),
                }
            }
            () = client.process_next() => {}
            event = events.recv() => match event {
                Ok(event) => log_event(&client, &event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dropped notifications"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.logout();
    info!("Bye");
    Ok(())
}

fn required_var(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

fn log_event(client: &ChatClient, event: &ClientEvent) {
    match event {
        ClientEvent::MessageAppended(id) => {
            if let Some(message) = client.message(id) {
                info!(from = %message.sender_name, "{}", message.content);
            }
        }
        ClientEvent::RoomFailed { peer, failure } => {
            warn!(peer = %peer, failure = %failure, "Conversation unavailable");
        }
        ClientEvent::PeerTyping { peer, active: true } => info!(peer = %peer, "typing..."),
        other => debug!(event = ?other, "Notification"),
    }
}
