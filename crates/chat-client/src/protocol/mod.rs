//! Wire protocol
//!
//! JSON text frames exchanged with the chat server.

mod events;
mod frames;
mod payloads;

pub use events::ChatEventType;
pub use frames::{ClientCommand, ServerEvent};
pub use payloads::{
    AckPayload, ErrorPayload, HistoryPayload, HistoryRequestPayload, MessagePayload,
    ReactionPayload, ReactionUpdatePayload, ReceivePayload, ReplyPayload, ReplyUpdatePayload,
    RoomPayload, SendMessagePayload,
};
