//! Conversation store
//!
//! The message table, the views derived from it, and read-only projections
//! (search and statistics).

mod analytics;
mod conversation;
mod pins;
mod search;
mod table;
mod thread;

pub use analytics::{ConversationStats, WEEKDAYS};
pub use conversation::{ConversationStore, ThreadSnapshot};
pub use pins::PinIndex;
pub use search::{search, SearchFilter};
pub use table::{AppendOutcome, MessageTable};
pub use thread::ThreadView;
