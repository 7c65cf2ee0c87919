//! Room sessions
//!
//! Tokens, room keys, and the per-room typing state.

mod room;
mod token;
mod typing;

pub use room::{RoomFailure, RoomKey, RoomSession, RoomState, Routing};
pub use token::{HistoryRequests, SessionToken, TokenSource};
pub use typing::TypingState;
