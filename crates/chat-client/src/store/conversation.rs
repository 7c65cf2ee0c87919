//! Conversation store
//!
//! The message table plus the two views derived from it: the pinned subset
//! and the open thread. Every mutation goes through here so the views cannot
//! drift from the table.

use super::{AppendOutcome, MessageTable, PinIndex, ThreadView};
use chat_core::{Message, MessageId, Reply};

/// The open thread: a parent message and its live reply list
#[derive(Debug, Clone, Copy)]
pub struct ThreadSnapshot<'a> {
    pub parent: &'a Message,
    pub replies: &'a [Reply],
}

/// State of the open room
#[derive(Debug, Default)]
pub struct ConversationStore {
    table: MessageTable,
    pins: PinIndex,
    thread: ThreadView,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in timeline order
    pub fn messages(&self) -> &[Message] {
        self.table.as_slice()
    }

    pub fn table(&self) -> &MessageTable {
        &self.table
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.table.get(id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Tear everything down (room ended)
    pub fn reset(&mut self) {
        self.table.clear();
        self.pins.clear();
        self.thread.close();
    }

    /// Apply a history snapshot
    ///
    /// The pin order is rebuilt from the snapshot's flags and any open thread
    /// is closed. `carry` entries (unsent local messages) that the snapshot
    /// does not contain are appended after it.
    pub fn replace_all(&mut self, messages: Vec<Message>, carry: Vec<Message>) {
        self.table.replace_all(messages);

        for message in carry {
            let known = self.table.contains(&message.id)
                || message
                    .correlation_id
                    .is_some_and(|cid| self.table.find_by_correlation(&cid).is_some());
            if !known {
                self.table.append(message);
            }
        }

        self.pins.clear();
        for message in self.table.iter().filter(|m| m.is_pinned) {
            self.pins.pin(&message.id);
        }
        self.thread.close();
    }

    /// Append a message or reconcile it with its optimistic copy
    pub fn append(&mut self, message: Message) -> AppendOutcome {
        let outcome = self.table.append(message);

        match &outcome {
            AppendOutcome::Appended(id) => self.sync_pin(id),
            AppendOutcome::Reconciled {
                id,
                previous_id: Some(previous),
            } => {
                self.pins.rekey(previous, id);
                self.thread.rekey(previous, id);
            }
            AppendOutcome::Reconciled { .. } => {}
        }
        outcome
    }

    /// Apply `updater` to one message; no-op if `id` is unknown
    pub fn mutate<R>(&mut self, id: &MessageId, updater: impl FnOnce(&mut Message) -> R) -> Option<R> {
        let result = self.table.mutate(id, updater)?;
        self.sync_pin(id);
        Some(result)
    }

    /// Move a message to a server-assigned id
    pub fn rekey(&mut self, old: &MessageId, new: MessageId) -> bool {
        if !self.table.rekey(old, new.clone()) {
            return false;
        }
        self.pins.rekey(old, &new);
        self.thread.rekey(old, &new);
        true
    }

    /// Pin a message; returns `true` if it was not pinned before
    pub fn pin(&mut self, id: &MessageId) -> bool {
        self.mutate(id, |m| !std::mem::replace(&mut m.is_pinned, true))
            .unwrap_or(false)
    }

    /// Unpin a message; returns `true` if it was pinned before
    pub fn unpin(&mut self, id: &MessageId) -> bool {
        self.mutate(id, |m| std::mem::replace(&mut m.is_pinned, false))
            .unwrap_or(false)
    }

    /// Pinned messages in pin order, read live from the table
    pub fn pinned(&self) -> Vec<&Message> {
        self.pins
            .ids()
            .iter()
            .filter_map(|id| self.table.get(id))
            .filter(|m| m.is_pinned)
            .collect()
    }

    pub fn pin_index(&self) -> &PinIndex {
        &self.pins
    }

    /// Focus the thread of `id`; no-op (returns `false`) if it is unknown
    pub fn open_thread(&mut self, id: &MessageId) -> bool {
        if !self.table.contains(id) {
            return false;
        }
        self.thread.open(id.clone());
        true
    }

    pub fn close_thread(&mut self) {
        self.thread.close();
    }

    /// The open thread, if any
    pub fn thread(&self) -> Option<ThreadSnapshot<'_>> {
        let parent = self.table.get(self.thread.focus()?)?;
        Some(ThreadSnapshot {
            parent,
            replies: &parent.replies,
        })
    }

    pub fn thread_focus(&self) -> Option<&MessageId> {
        self.thread.focus()
    }

    fn sync_pin(&mut self, id: &MessageId) {
        match self.table.get(id) {
            Some(message) if message.is_pinned => {
                self.pins.pin(id);
            }
            _ => {
                self.pins.unpin(id);
            }
        }
    }
}
