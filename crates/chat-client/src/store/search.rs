//! Message search over the open room

use chat_core::{Message, MessageType, UserId};

/// Which side of the conversation to search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFilter {
    #[default]
    All,
    /// Messages sent by the local user
    Sent,
    /// Messages sent by the peer
    Received,
}

impl SearchFilter {
    fn admits(self, message: &Message, local_user: &UserId) -> bool {
        match self {
            Self::All => true,
            Self::Sent => message.is_from(local_user),
            Self::Received => !message.is_from(local_user),
        }
    }
}

/// Find messages whose content contains `query`, ignoring case
///
/// Voice messages are never matched and a blank query matches nothing. At
/// most the last `limit` matches are returned, in timeline order.
pub fn search<'a>(
    messages: &'a [Message],
    local_user: &UserId,
    query: &str,
    filter: SearchFilter,
    limit: usize,
) -> Vec<&'a Message> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    let matches: Vec<&Message> = messages
        .iter()
        .filter(|m| m.kind.message_type() != MessageType::Voice)
        .filter(|m| filter.admits(m, local_user))
        .filter(|m| m.content.to_lowercase().contains(&needle))
        .collect();

    let skip = matches.len().saturating_sub(limit);
    matches.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::{MessageId, MessageKind, VoiceClip};

    fn text(id: usize, sender: &str, content: &str) -> Message {
        Message::new(
            MessageId::new(id.to_string()),
            UserId::new(sender),
            sender.to_string(),
            content.to_string(),
            MessageKind::Text,
        )
    }

    fn timeline() -> Vec<Message> {
        let mut voice = text(4, "bob", "Voice message about lunch");
        voice.kind = MessageKind::Voice(VoiceClip {
            duration: 3.0,
            waveform: vec![0.2; 8],
        });
        vec![
            text(1, "alice", "Lunch tomorrow?"),
            text(2, "bob", "Sure, LUNCH at noon"),
            text(3, "bob", "see you"),
            voice,
        ]
    }

    #[test]
    fn test_case_insensitive_and_skips_voice() {
        let messages = timeline();
        let alice = UserId::new("alice");

        let found = search(&messages, &alice, "lunch", SearchFilter::All, 50);
        let ids: Vec<&str> = found.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_filters() {
        let messages = timeline();
        let alice = UserId::new("alice");

        let sent = search(&messages, &alice, "lunch", SearchFilter::Sent, 50);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id.as_str(), "1");

        let received = search(&messages, &alice, "lunch", SearchFilter::Received, 50);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id.as_str(), "2");
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let messages = timeline();
        let alice = UserId::new("alice");
        assert!(search(&messages, &alice, "   ", SearchFilter::All, 50).is_empty());
        assert!(search(&messages, &alice, "", SearchFilter::All, 50).is_empty());
    }

    #[test]
    fn test_limit_keeps_latest() {
        let messages: Vec<Message> = (0..60).map(|i| text(i, "bob", "ping")).collect();
        let found = search(&messages, &UserId::new("alice"), "PING", SearchFilter::All, 50);

        assert_eq!(found.len(), 50);
        assert_eq!(found[0].id.as_str(), "10");
        assert_eq!(found[49].id.as_str(), "59");
    }
}
