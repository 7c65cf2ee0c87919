//! # chat-client
//!
//! Client-side engine for two-party real-time conversations: the wire
//! protocol, the server connection, room sessions, and the conversation
//! store behind a single [`ChatClient`] facade.

pub mod client;
pub mod connection;
pub mod dispatcher;
pub mod events;
pub mod protocol;
pub mod session;
pub mod store;

pub use client::ChatClient;
pub use connection::{ConnectionState, Connector, TransportError, WsConnector};
pub use dispatcher::OutgoingContent;
pub use events::ClientEvent;
pub use session::{RoomFailure, RoomState, SessionToken};
pub use store::{ConversationStats, SearchFilter, ThreadSnapshot};
