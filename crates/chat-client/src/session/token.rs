//! Session tokens
//!
//! Every room session gets a fresh token. Asynchronous results are checked
//! against the token of the session that asked for them.

use std::collections::VecDeque;
use std::fmt;

/// Monotonically increasing room-session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues tokens in increasing order
#[derive(Debug, Default)]
pub struct TokenSource {
    last: u64,
}

impl TokenSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next token
    pub fn issue(&mut self) -> SessionToken {
        self.last += 1;
        SessionToken(self.last)
    }
}

/// Outstanding `get-history` requests in the order they were sent
///
/// Servers that echo `requestId` are matched exactly. For the others the
/// single connection answers in request order, so the oldest request wins.
#[derive(Debug, Default)]
pub struct HistoryRequests {
    pending: VecDeque<SessionToken>,
}

impl HistoryRequests {
    /// Record a request sent under `token`
    pub fn push(&mut self, token: SessionToken) {
        self.pending.push_back(token);
    }

    /// Work out which request a reply answers and forget it
    ///
    /// Returns `None` for an unsolicited reply.
    pub fn resolve(&mut self, echoed: Option<u64>) -> Option<SessionToken> {
        match echoed {
            Some(value) => {
                let token = SessionToken(value);
                self.pending.retain(|pending| *pending != token);
                Some(token)
            }
            None => self.pending.pop_front(),
        }
    }

    /// Forget a request that was answered with an error
    pub fn forget(&mut self, token: SessionToken) {
        self.pending.retain(|pending| *pending != token);
    }

    /// Forget everything (the link that carried the requests is gone)
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increase() {
        let mut source = TokenSource::new();
        let a = source.issue();
        let b = source.issue();
        assert!(b > a);
        assert_eq!(a.value() + 1, b.value());
        assert_eq!(a.to_string(), "#1");
    }

    #[test]
    fn test_echoed_request_id_wins() {
        let mut requests = HistoryRequests::default();
        requests.push(SessionToken::new(1));
        requests.push(SessionToken::new(2));

        assert_eq!(requests.resolve(Some(2)), Some(SessionToken::new(2)));
        assert_eq!(requests.len(), 1);
        assert_eq!(requests.resolve(None), Some(SessionToken::new(1)));
        assert!(requests.is_empty());
    }

    #[test]
    fn test_unechoed_replies_are_fifo() {
        let mut requests = HistoryRequests::default();
        requests.push(SessionToken::new(4));
        requests.push(SessionToken::new(5));

        assert_eq!(requests.resolve(None), Some(SessionToken::new(4)));
        assert_eq!(requests.resolve(None), Some(SessionToken::new(5)));
        assert_eq!(requests.resolve(None), None);
    }

    #[test]
    fn test_forget_and_clear() {
        let mut requests = HistoryRequests::default();
        requests.push(SessionToken::new(1));
        requests.push(SessionToken::new(2));
        requests.forget(SessionToken::new(1));
        assert_eq!(requests.resolve(None), Some(SessionToken::new(2)));

        requests.push(SessionToken::new(3));
        requests.clear();
        assert!(requests.is_empty());
    }
}
