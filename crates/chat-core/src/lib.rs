//! # chat-core
//!
//! Domain layer for the conversation engine: identifiers, message entities,
//! the message-kind tagged union, and the reaction engine.
//! This crate has zero dependencies on infrastructure (transport, runtime, etc.).

pub mod entities;
pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Attachment, Message, MessageKind, MessageStatus, MessageType, Reaction, ReactionChange,
    Reply, VoiceClip,
};
pub use error::DomainError;
pub use value_objects::{MessageId, Snowflake, SnowflakeGenerator, SnowflakeParseError, UserId};
