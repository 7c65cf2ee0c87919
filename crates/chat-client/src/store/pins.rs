//! Pin index
//!
//! Pin order for messages whose `is_pinned` flag is set. The index holds ids
//! only; pinned messages are always read from the table.

use chat_core::MessageId;

/// Ids of pinned messages, oldest pin first
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PinIndex {
    order: Vec<MessageId>,
}

impl PinIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` at the end; an already pinned id keeps its place
    pub fn pin(&mut self, id: &MessageId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.order.push(id.clone());
        true
    }

    pub fn unpin(&mut self, id: &MessageId) -> bool {
        let before = self.order.len();
        self.order.retain(|pinned| pinned != id);
        self.order.len() != before
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.order.contains(id)
    }

    /// Keep the slot of `old` under `new`
    pub fn rekey(&mut self, old: &MessageId, new: &MessageId) {
        if let Some(slot) = self.order.iter_mut().find(|pinned| *pinned == old) {
            *slot = new.clone();
        }
    }

    pub fn ids(&self) -> &[MessageId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
