//! Snowflake ID - 64-bit locally generated identifier
//!
//! Structure:
//! - Bits 63-22: Timestamp (milliseconds since custom epoch)
//! - Bits 21-12: Worker ID (0-1023), one per client instance
//! - Bits 11-0:  Sequence number (0-4095)
//!
//! The generator keeps a logical clock: it never hands out a timestamp lower
//! than the last one it used, so ids stay strictly increasing even when the
//! wall clock jumps backwards.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

const WORKER_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const MAX_WORKER_ID: u16 = (1 << WORKER_BITS) - 1;
const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;

/// Locally generated 64-bit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// Custom epoch: 2024-01-01 00:00:00 UTC (milliseconds)
    pub const EPOCH: i64 = 1_704_067_200_000;

    /// Create a new Snowflake from a raw i64 value
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Extract timestamp (milliseconds since Unix epoch)
    #[inline]
    pub fn timestamp(&self) -> i64 {
        (self.0 >> (WORKER_BITS + SEQUENCE_BITS)) + Self::EPOCH
    }

    /// Extract worker ID (0-1023)
    #[inline]
    pub fn worker_id(&self) -> u16 {
        ((self.0 >> SEQUENCE_BITS) & i64::from(MAX_WORKER_ID)) as u16
    }

    /// Extract sequence number (0-4095)
    #[inline]
    pub fn sequence(&self) -> u16 {
        (self.0 & MAX_SEQUENCE) as u16
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        s.parse::<i64>()
            .map(Snowflake)
            .map_err(|_| SnowflakeParseError::InvalidFormat)
    }

    fn compose(timestamp: i64, worker_id: u16, sequence: i64) -> Self {
        Self(
            ((timestamp - Self::EPOCH) << (WORKER_BITS + SEQUENCE_BITS))
                | (i64::from(worker_id) << SEQUENCE_BITS)
                | sequence,
        )
    }
}

/// Error when parsing a Snowflake from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid snowflake format")]
    InvalidFormat,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Snowflake::parse(s)
    }
}

/// Monotonic Snowflake generator owned by one client
///
/// Rapid successive calls within the same millisecond consume the sequence
/// space; once it is exhausted the generator borrows the next millisecond
/// instead of waiting for the wall clock.
pub struct SnowflakeGenerator {
    worker_id: u16,
    last_timestamp: i64,
    sequence: i64,
    clock: fn() -> i64,
}

impl SnowflakeGenerator {
    /// Create a new generator with the given worker ID
    ///
    /// # Panics
    /// Panics if worker_id >= 1024
    pub fn new(worker_id: u16) -> Self {
        Self::with_clock(worker_id, wall_clock_millis)
    }

    /// Create a generator with a random worker ID
    ///
    /// Two clients talking to each other should not share a worker ID, so
    /// this is the default when none is configured.
    pub fn with_random_worker() -> Self {
        Self::new(rand::thread_rng().gen_range(0..=MAX_WORKER_ID))
    }

    /// Create a generator reading time from `clock` (milliseconds since Unix epoch)
    ///
    /// # Panics
    /// Panics if worker_id >= 1024
    pub fn with_clock(worker_id: u16, clock: fn() -> i64) -> Self {
        assert!(worker_id <= MAX_WORKER_ID, "Worker ID must be < 1024");
        Self {
            worker_id,
            last_timestamp: 0,
            sequence: 0,
            clock,
        }
    }

    /// Generate a new unique Snowflake ID
    pub fn generate(&mut self) -> Snowflake {
        let now = (self.clock)().max(Snowflake::EPOCH);

        if now > self.last_timestamp {
            self.last_timestamp = now;
            self.sequence = 0;
        } else {
            self.sequence += 1;
            if self.sequence > MAX_SEQUENCE {
                self.last_timestamp += 1;
                self.sequence = 0;
            }
        }

        Snowflake::compose(self.last_timestamp, self.worker_id, self.sequence)
    }

    /// Get the worker ID of this generator
    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::with_random_worker()
    }
}

impl fmt::Debug for SnowflakeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeGenerator")
            .field("worker_id", &self.worker_id)
            .field("last_timestamp", &self.last_timestamp)
            .finish_non_exhaustive()
    }
}

fn wall_clock_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const FIXED_MS: i64 = Snowflake::EPOCH + 5_000;

    fn fixed_clock() -> i64 {
        FIXED_MS
    }

    fn stale_clock() -> i64 {
        // Far in the past: the generator must still never go backwards
        0
    }

    #[test]
    fn test_snowflake_parse() {
        let sf = Snowflake::parse("123456789").unwrap();
        assert_eq!(sf.into_inner(), 123_456_789);

        assert!(Snowflake::parse("invalid").is_err());
    }

    #[test]
    fn test_snowflake_display() {
        let sf = Snowflake::new(123_456_789);
        assert_eq!(sf.to_string(), "123456789");
    }

    #[test]
    fn test_generator_creates_unique_ids() {
        let mut gen = SnowflakeGenerator::new(1);
        let mut ids = HashSet::new();

        for _ in 0..1000 {
            assert!(ids.insert(gen.generate()), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_generator_ids_are_monotonic_within_one_millisecond() {
        let mut gen = SnowflakeGenerator::with_clock(3, fixed_clock);
        let mut last = Snowflake::new(0);

        for _ in 0..10_000 {
            let id = gen.generate();
            assert!(id > last, "IDs should be monotonically increasing");
            last = id;
        }
    }

    #[test]
    fn test_sequence_overflow_borrows_next_millisecond() {
        let mut gen = SnowflakeGenerator::with_clock(0, fixed_clock);

        let first = gen.generate();
        assert_eq!(first.timestamp(), FIXED_MS);
        assert_eq!(first.sequence(), 0);

        for _ in 0..MAX_SEQUENCE {
            gen.generate();
        }

        let borrowed = gen.generate();
        assert_eq!(borrowed.timestamp(), FIXED_MS + 1);
        assert_eq!(borrowed.sequence(), 0);
    }

    #[test]
    fn test_clock_before_epoch_still_unique() {
        let mut gen = SnowflakeGenerator::with_clock(9, stale_clock);
        let a = gen.generate();
        let b = gen.generate();

        assert!(b > a);
        assert_eq!(a.timestamp(), Snowflake::EPOCH);
    }

    #[test]
    fn test_generator_worker_id_preserved() {
        let mut gen = SnowflakeGenerator::new(42);
        let id = gen.generate();
        assert_eq!(id.worker_id(), 42);
        assert_eq!(gen.worker_id(), 42);
    }

    #[test]
    fn test_random_worker_in_range() {
        let gen = SnowflakeGenerator::with_random_worker();
        assert!(gen.worker_id() <= MAX_WORKER_ID);
    }

    #[test]
    #[should_panic(expected = "Worker ID must be < 1024")]
    fn test_generator_invalid_worker_id() {
        SnowflakeGenerator::new(1024);
    }
}
