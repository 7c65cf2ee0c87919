//! Thread view
//!
//! Remembers which message's replies are on display. The replies themselves
//! are read from the table on every access.

use chat_core::MessageId;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThreadView {
    focus: Option<MessageId>,
}

impl ThreadView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, id: MessageId) {
        self.focus = Some(id);
    }

    pub fn close(&mut self) {
        self.focus = None;
    }

    pub fn focus(&self) -> Option<&MessageId> {
        self.focus.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.focus.is_some()
    }

    /// Follow the focused message to a new id
    pub fn rekey(&mut self, old: &MessageId, new: &MessageId) {
        if self.focus.as_ref() == Some(old) {
            self.focus = Some(new.clone());
        }
    }
}
