//! Conversation statistics
//!
//! Computed on demand from a read-only view of the timeline. Times are
//! bucketed in UTC.

use chat_core::{Message, MessageType, UserId};
use chrono::{Datelike, Timelike};
use std::collections::BTreeMap;

/// Weekday labels, Sunday first
pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Statistics for one conversation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationStats {
    pub total_messages: usize,
    pub sent_by_user: usize,
    pub received_by_user: usize,
    /// Mean content length in characters, rounded
    pub average_length: usize,
    pub reaction_count: usize,
    pub message_types: BTreeMap<MessageType, usize>,
    /// Messages per weekday, Sunday first
    pub daily_activity: [usize; 7],
    /// Messages per hour of day
    pub hourly_activity: [usize; 24],
    /// Index into [`WEEKDAYS`]; `None` for an empty conversation
    pub most_active_day: Option<usize>,
    pub most_active_hour: Option<u32>,
}

impl ConversationStats {
    /// Compute statistics as seen by `local_user`
    pub fn compute(messages: &[Message], local_user: &UserId) -> Self {
        let mut stats = Self {
            total_messages: messages.len(),
            ..Self::default()
        };
        if messages.is_empty() {
            return stats;
        }

        let mut total_length = 0usize;
        for message in messages {
            if message.is_from(local_user) {
                stats.sent_by_user += 1;
            } else {
                stats.received_by_user += 1;
            }
            total_length += message.content.chars().count();
            stats.reaction_count += message.reaction_count();
            *stats
                .message_types
                .entry(message.kind.message_type())
                .or_default() += 1;

            let day = message.timestamp.weekday().num_days_from_sunday() as usize;
            stats.daily_activity[day] += 1;
            stats.hourly_activity[message.timestamp.hour() as usize] += 1;
        }

        stats.average_length = (total_length as f64 / messages.len() as f64).round() as usize;
        stats.most_active_day = busiest(&stats.daily_activity);
        stats.most_active_hour = busiest(&stats.hourly_activity).map(|hour| hour as u32);
        stats
    }

    /// Label of the most active weekday
    pub fn most_active_day_name(&self) -> Option<&'static str> {
        self.most_active_day.map(|day| WEEKDAYS[day])
    }

    /// Count for one message type
    pub fn count_of(&self, message_type: MessageType) -> usize {
        self.message_types.get(&message_type).copied().unwrap_or(0)
    }
}

// Earliest bucket wins a tie
fn busiest(buckets: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, &count) in buckets.iter().enumerate() {
        if count > 0 && best.is_none_or(|(_, top)| count > top) {
            best = Some((index, count));
        }
    }
    best.map(|(index, _)| index)
}
