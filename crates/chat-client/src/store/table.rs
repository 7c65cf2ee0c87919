//! Message table
//!
//! Canonical, id-indexed store of the messages in the open room. Entries keep
//! arrival order; nothing is ever deleted except by a wholesale replace.

use chat_core::{Message, MessageId, UserId};
use std::collections::HashMap;
use uuid::Uuid;

/// Result of [`MessageTable::append`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new entry was added at the end
    Appended(MessageId),
    /// The message was already present and was updated in place
    Reconciled {
        id: MessageId,
        /// Set when the entry moved to a server-assigned id
        previous_id: Option<MessageId>,
    },
}

impl AppendOutcome {
    /// Id of the affected entry
    pub fn id(&self) -> &MessageId {
        match self {
            Self::Appended(id) | Self::Reconciled { id, .. } => id,
        }
    }
}

/// Id-indexed message store
#[derive(Debug, Default)]
pub struct MessageTable {
    messages: Vec<Message>,
    by_id: HashMap<MessageId, usize>,
    by_correlation: HashMap<Uuid, MessageId>,
}

impl MessageTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole contents with a snapshot
    ///
    /// Later duplicates of an id are dropped.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.clear();
        for message in messages {
            if self.by_id.contains_key(&message.id) {
                tracing::debug!(message_id = %message.id, "Dropping duplicate id from snapshot");
                continue;
            }
            self.push(message);
        }
    }

    /// Append a message, or reconcile it with the entry it duplicates
    ///
    /// A message duplicates an entry with the same correlation id or, failing
    /// that, the same id. Reconciling advances the status and, for a
    /// correlation match under a new id, moves the entry to that id.
    pub fn append(&mut self, message: Message) -> AppendOutcome {
        let existing = message
            .correlation_id
            .and_then(|cid| self.by_correlation.get(&cid).cloned())
            .or_else(|| {
                self.by_id
                    .contains_key(&message.id)
                    .then(|| message.id.clone())
            });

        let Some(existing_id) = existing else {
            let id = message.id.clone();
            self.push(message);
            return AppendOutcome::Appended(id);
        };

        if let Some(entry) = self.get_mut(&existing_id) {
            entry.status = entry.status.reconcile(message.status);
        }

        if message.id != existing_id && self.rekey(&existing_id, message.id.clone()) {
            return AppendOutcome::Reconciled {
                id: message.id,
                previous_id: Some(existing_id),
            };
        }
        AppendOutcome::Reconciled {
            id: existing_id,
            previous_id: None,
        }
    }

    /// Apply `updater` to the message with `id`
    ///
    /// Returns `None` (and does nothing) if the id is unknown.
    pub fn mutate<R>(&mut self, id: &MessageId, updater: impl FnOnce(&mut Message) -> R) -> Option<R> {
        let index = *self.by_id.get(id)?;
        let message = &mut self.messages[index];
        let result = updater(message);

        // Ids change only through rekey
        if message.id != *id {
            tracing::warn!(message_id = %id, "Ignoring id change made by an updater");
            message.id = id.clone();
        }
        Some(result)
    }

    /// Move an entry to a new id
    ///
    /// Fails if `old` is unknown or `new` is taken.
    pub fn rekey(&mut self, old: &MessageId, new: MessageId) -> bool {
        if self.by_id.contains_key(&new) {
            return false;
        }
        let Some(index) = self.by_id.remove(old) else {
            return false;
        };

        let message = &mut self.messages[index];
        message.id = new.clone();
        if let Some(cid) = message.correlation_id {
            self.by_correlation.insert(cid, new.clone());
        }
        self.by_id.insert(new, index);
        true
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.by_id.get(id).map(|&index| &self.messages[index])
    }

    fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        let index = *self.by_id.get(id)?;
        Some(&mut self.messages[index])
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Find the entry stamped with a correlation id
    pub fn find_by_correlation(&self, correlation_id: &Uuid) -> Option<&MessageId> {
        self.by_correlation.get(correlation_id)
    }

    /// Messages in timeline order
    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Copies of `user`'s messages that failed to send
    pub fn failed_from(&self, user: &UserId) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.is_failed() && m.is_from(user))
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.by_id.clear();
        self.by_correlation.clear();
    }

    fn push(&mut self, message: Message) {
        self.by_id.insert(message.id.clone(), self.messages.len());
        if let Some(cid) = message.correlation_id {
            self.by_correlation.insert(cid, message.id.clone());
        }
        self.messages.push(message);
    }
}
