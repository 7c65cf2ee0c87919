//! Message and user identifiers
//!
//! Both are opaque strings on the wire. Message ids minted by this client are
//! rendered snowflakes; ids minted elsewhere (the peer, the server) are taken
//! as-is.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::Snowflake;

/// Identifier of a message or reply
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap an existing id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the id is empty (never valid on the wire)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Snowflake> for MessageId {
    fn from(id: Snowflake) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for MessageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

// Peers built on JavaScript sometimes send millisecond timestamps as bare numbers
impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct MessageIdVisitor;

        impl Visitor<'_> for MessageIdVisitor {
            type Value = MessageId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer message id")
            }

            fn visit_i64<E>(self, value: i64) -> Result<MessageId, E>
            where
                E: de::Error,
            {
                Ok(MessageId(value.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<MessageId, E>
            where
                E: de::Error,
            {
                Ok(MessageId(value.to_string()))
            }

            fn visit_str<E>(self, value: &str) -> Result<MessageId, E>
            where
                E: de::Error,
            {
                if value.is_empty() {
                    return Err(de::Error::custom("empty message id"));
                }
                Ok(MessageId(value.to_string()))
            }
        }

        deserializer.deserialize_any(MessageIdVisitor)
    }
}

/// Identifier of a conversation participant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
