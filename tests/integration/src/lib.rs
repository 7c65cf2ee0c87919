//! Integration test utilities for the chat client
//!
//! This crate drives a [`chat_client::ChatClient`] end to end against the
//! in-memory server, playing the server's side of each exchange.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
