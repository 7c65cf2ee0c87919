//! Domain entities - core conversation objects

mod kind;
mod message;
pub mod reaction;
mod reply;

pub use kind::{Attachment, MessageKind, MessageType, VoiceClip};
pub use message::{Message, MessageStatus};
pub use reaction::{Reaction, ReactionChange};
pub use reply::Reply;
