//! Typing indicators

use std::time::Duration;
use tokio::time::Instant;

/// Local and peer typing state for the active room
#[derive(Debug, Clone)]
pub struct TypingState {
    ttl: Duration,
    local_active: bool,
    /// Peer indicator expiry; `Some` while the peer is typing
    peer_until: Option<Instant>,
}

impl TypingState {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            local_active: false,
            peer_until: None,
        }
    }

    /// Record the local user's typing state
    ///
    /// Returns `true` on a transition, i.e. when a signal should be sent.
    pub fn set_local(&mut self, active: bool) -> bool {
        if self.local_active == active {
            return false;
        }
        self.local_active = active;
        true
    }

    pub fn is_local_active(&self) -> bool {
        self.local_active
    }

    /// The peer started (or is still) typing; returns `true` if the
    /// indicator was off before
    pub fn peer_started(&mut self, now: Instant) -> bool {
        let was_typing = self.is_peer_typing(now);
        self.peer_until = Some(now + self.ttl);
        !was_typing
    }

    /// The peer stopped typing; returns `true` if the indicator was on
    pub fn peer_stopped(&mut self) -> bool {
        self.peer_until.take().is_some()
    }

    pub fn is_peer_typing(&self, now: Instant) -> bool {
        self.peer_until.is_some_and(|until| now < until)
    }

    /// Clear an indicator whose stop signal never came; returns `true` if
    /// it was cleared
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.peer_until {
            Some(until) if now >= until => {
                self.peer_until = None;
                true
            }
            _ => false,
        }
    }

    /// When the peer indicator expires
    pub fn deadline(&self) -> Option<Instant> {
        self.peer_until
    }

    /// Forget everything (room switch)
    pub fn reset(&mut self) {
        self.local_active = false;
        self.peer_until = None;
    }
}
