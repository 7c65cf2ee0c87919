//! Value objects - immutable types that represent domain concepts

mod ids;
mod snowflake;

pub use ids::{MessageId, UserId};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
