//! Reaction entity and the reaction engine
//!
//! A message's reactions are an ordered list of per-emoji entries. Each entry
//! holds the set of users who reacted with that emoji; its count is the size
//! of that set, and an entry whose set becomes empty is removed.

use crate::value_objects::UserId;

/// Aggregated reactions for one emoji on one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub emoji: String,
    users: Vec<UserId>,
    has_reacted: bool,
}

impl Reaction {
    /// Create a reaction entry holding a single user
    pub fn new(emoji: impl Into<String>, user: UserId, local_user: &UserId) -> Self {
        let has_reacted = &user == local_user;
        Self {
            emoji: emoji.into(),
            users: vec![user],
            has_reacted,
        }
    }

    /// Rebuild an entry from untrusted parts (e.g. a history snapshot)
    ///
    /// Duplicate users are dropped and `has_reacted` is recomputed for
    /// `local_user`. Returns `None` when no users remain.
    pub fn from_users(
        emoji: impl Into<String>,
        users: impl IntoIterator<Item = UserId>,
        local_user: &UserId,
    ) -> Option<Self> {
        let mut unique: Vec<UserId> = Vec::new();
        for user in users {
            if !unique.contains(&user) {
                unique.push(user);
            }
        }
        if unique.is_empty() {
            return None;
        }
        let has_reacted = unique.contains(local_user);
        Some(Self {
            emoji: emoji.into(),
            users: unique,
            has_reacted,
        })
    }

    /// Number of users who reacted
    #[inline]
    pub fn count(&self) -> usize {
        self.users.len()
    }

    /// Users who reacted, in the order they reacted
    #[inline]
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Whether the local user is among the reactors
    #[inline]
    pub fn has_reacted(&self) -> bool {
        self.has_reacted
    }

    /// Check if a user reacted with this emoji
    pub fn contains(&self, user: &UserId) -> bool {
        self.users.contains(user)
    }

    fn add(&mut self, user: UserId, local_user: &UserId) {
        if &user == local_user {
            self.has_reacted = true;
        }
        self.users.push(user);
    }

    fn remove(&mut self, user: &UserId, local_user: &UserId) {
        self.users.retain(|u| u != user);
        if user == local_user {
            self.has_reacted = false;
        }
    }
}

/// Outcome of a reaction toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    /// The user now reacts with the emoji
    Added,
    /// The user no longer reacts with the emoji
    Removed,
}

impl ReactionChange {
    /// Whether the user's reaction is present after the change
    pub fn is_active(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Toggle `user`'s reaction with `emoji`
///
/// Removes the user if they already reacted (dropping the entry when it
/// empties), otherwise adds them, creating the entry at the end of the list
/// when the emoji is new. Applying the same toggle twice restores the list.
pub fn toggle(reactions: &mut Vec<Reaction>, emoji: &str, user: &UserId) -> ReactionChange {
    match reactions.iter().position(|r| r.emoji == emoji) {
        Some(idx) if reactions[idx].contains(user) => {
            reactions[idx].remove(user, user);
            if reactions[idx].count() == 0 {
                reactions.remove(idx);
            }
            ReactionChange::Removed
        }
        Some(idx) => {
            reactions[idx].add(user.clone(), user);
            ReactionChange::Added
        }
        None => {
            reactions.push(Reaction::new(emoji, user.clone(), user));
            ReactionChange::Added
        }
    }
}

/// Set whether `user` reacts with `emoji`
///
/// Used for reaction updates relayed from the peer: unlike [`toggle`] it is
/// idempotent, so a duplicated update cannot flip the state back. Returns
/// `true` if the list changed.
pub fn set_membership(
    reactions: &mut Vec<Reaction>,
    emoji: &str,
    user: &UserId,
    active: bool,
    local_user: &UserId,
) -> bool {
    let position = reactions.iter().position(|r| r.emoji == emoji);

    match (position, active) {
        (Some(idx), true) => {
            if reactions[idx].contains(user) {
                return false;
            }
            reactions[idx].add(user.clone(), local_user);
            true
        }
        (Some(idx), false) => {
            if !reactions[idx].contains(user) {
                return false;
            }
            reactions[idx].remove(user, local_user);
            if reactions[idx].count() == 0 {
                reactions.remove(idx);
            }
            true
        }
        (None, true) => {
            reactions.push(Reaction::new(emoji, user.clone(), local_user));
            true
        }
        (None, false) => false,
    }
}

/// Total number of reactions across all emoji
pub fn total(reactions: &[Reaction]) -> usize {
    reactions.iter().map(Reaction::count).sum()
}
