//! Room sessions
//!
//! A room is the conversation between the local user and one peer. At most
//! one room session is active at a time.

use super::SessionToken;
use chat_common::ClientError;
use chat_core::UserId;
use std::fmt;
use tokio::time::Instant;

/// Unordered pair of participants identifying a room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey {
    low: UserId,
    high: UserId,
}

impl RoomKey {
    #[must_use]
    pub fn new(a: &UserId, b: &UserId) -> Self {
        if a <= b {
            Self {
                low: a.clone(),
                high: b.clone(),
            }
        } else {
            Self {
                low: b.clone(),
                high: a.clone(),
            }
        }
    }

    /// Check if `user` is one of the participants
    pub fn contains(&self, user: &UserId) -> bool {
        &self.low == user || &self.high == user
    }

    /// Check whether traffic from `sender` to `recipient` belongs to this room
    pub fn admits(&self, sender: &UserId, recipient: &UserId) -> bool {
        *self == Self::new(sender, recipient)
    }
}

/// Where an inbound frame belongs relative to the active room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Addressed to this room
    Room,
    /// Sent by the local user without a recipient; it belongs here only if
    /// it refers to something already in the timeline
    LocalEcho,
    /// Another room's traffic
    Elsewhere,
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

/// Why a room session failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomFailure {
    /// No connection came up in time to send the join
    JoinTimeout,
    /// The history request timed out or was rejected
    HistoryLoad(String),
}

impl RoomFailure {
    /// Convert into the client error taxonomy
    #[must_use]
    pub fn to_error(&self) -> ClientError {
        match self {
            Self::JoinTimeout => ClientError::JoinTimeout,
            Self::HistoryLoad(reason) => ClientError::HistoryLoadFailure(reason.clone()),
        }
    }
}

impl fmt::Display for RoomFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_error())
    }
}

/// Lifecycle of a room session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomState {
    /// Waiting for a connection to send the join on
    Joining,
    /// Join sent, waiting for the history snapshot
    LoadingHistory,
    /// Snapshot applied
    Ready,
    /// Gave up; the caller may retry
    Failed(RoomFailure),
}

impl RoomState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Joining => "joining",
            Self::LoadingHistory => "loading-history",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(failure) => write!(f, "failed ({failure})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// The active conversation with one peer
#[derive(Debug, Clone)]
pub struct RoomSession {
    local_user: UserId,
    peer: UserId,
    key: RoomKey,
    token: SessionToken,
    state: RoomState,
    /// Deadline of the current `Joining` or `LoadingHistory` phase
    deadline: Option<Instant>,
}

impl RoomSession {
    /// Start a session in the `Joining` state
    #[must_use]
    pub fn new(local_user: UserId, peer: UserId, token: SessionToken) -> Self {
        let key = RoomKey::new(&local_user, &peer);
        Self {
            local_user,
            peer,
            key,
            token,
            state: RoomState::Joining,
            deadline: None,
        }
    }

    pub fn local_user(&self) -> &UserId {
        &self.local_user
    }

    pub fn peer(&self) -> &UserId {
        &self.peer
    }

    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Move under a new token (after a reconnect or a retry)
    pub fn restart(&mut self, token: SessionToken) {
        self.token = token;
        self.state = RoomState::Joining;
        self.deadline = None;
    }

    /// Wait for a connection until `deadline`
    pub fn await_connection(&mut self, deadline: Instant) {
        self.state = RoomState::Joining;
        self.deadline = Some(deadline);
    }

    /// Wait for the history snapshot until `deadline`
    pub fn await_history(&mut self, deadline: Instant) {
        self.state = RoomState::LoadingHistory;
        self.deadline = Some(deadline);
    }

    pub fn mark_ready(&mut self) {
        self.state = RoomState::Ready;
        self.deadline = None;
    }

    pub fn fail(&mut self, failure: RoomFailure) {
        self.state = RoomState::Failed(failure);
        self.deadline = None;
    }

    /// Route inbound traffic from `sender` to `recipient`
    ///
    /// Without a recipient only the peer is trusted: the local user takes
    /// part in every room.
    pub fn route(&self, sender: &UserId, recipient: Option<&UserId>) -> Routing {
        match recipient {
            Some(recipient) if self.key.admits(sender, recipient) => Routing::Room,
            Some(_) => Routing::Elsewhere,
            None if sender == &self.peer => Routing::Room,
            None if sender == &self.local_user => Routing::LocalEcho,
            None => Routing::Elsewhere,
        }
    }

    /// Check whether a history snapshot issued under `token` may be applied
    pub fn accepts_history(&self, token: SessionToken) -> bool {
        token == self.token && matches!(self.state, RoomState::LoadingHistory | RoomState::Ready)
    }

    /// Fail the session if its current phase ran past its deadline
    pub fn expire(&mut self, now: Instant) -> Option<RoomFailure> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        let failure = match self.state {
            RoomState::Joining => RoomFailure::JoinTimeout,
            RoomState::LoadingHistory => {
                RoomFailure::HistoryLoad("timed out waiting for history".to_string())
            }
            RoomState::Ready | RoomState::Failed(_) => {
                self.deadline = None;
                return None;
            }
        };
        self.fail(failure.clone());
        Some(failure)
    }
}
