//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub timeouts: TimeoutConfig,
    pub reconnect: ReconnectConfig,
    pub limits: LimitsConfig,
    pub snowflake: SnowflakeConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Chat server endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// WebSocket URL, e.g. `ws://localhost:5000/ws`
    pub url: String,
    /// Capacity of the outbound frame queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

/// Request-level timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    /// How long a room may wait for a connection to send its join on
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
    /// How long a room may wait for its history snapshot
    #[serde(default = "default_history_timeout_ms")]
    pub history_timeout_ms: u64,
    /// How long a peer typing indicator lasts without a stop event
    #[serde(default = "default_typing_ttl_ms")]
    pub typing_ttl_ms: u64,
}

impl TimeoutConfig {
    #[must_use]
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    #[must_use]
    pub fn history_timeout(&self) -> Duration {
        Duration::from_millis(self.history_timeout_ms)
    }

    #[must_use]
    pub fn typing_ttl(&self) -> Duration {
        Duration::from_millis(self.typing_ttl_ms)
    }
}

/// Reconnection backoff policy
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_reconnect_initial_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub max_delay_ms: u64,
    /// Attempts before giving up; 0 retries forever
    #[serde(default = "default_reconnect_max_attempts")]
    pub max_attempts: u32,
}

impl ReconnectConfig {
    /// Delay before the given (1-based) attempt: doubles from the initial
    /// delay and is capped at the maximum
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.initial_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Check whether another attempt is allowed
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts == 0 || attempt <= self.max_attempts
    }
}

/// Content limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,
    #[serde(default = "default_search_limit")]
    pub search_result_limit: usize,
}

/// Snowflake ID generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    /// Fixed worker id; a random one is chosen when unset
    #[serde(default)]
    pub worker_id: Option<u16>,
}

// Default value functions
fn default_app_name() -> String {
    "chat-client".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_join_timeout_ms() -> u64 {
    10_000
}

fn default_history_timeout_ms() -> u64 {
    10_000
}

fn default_typing_ttl_ms() -> u64 {
    5_000
}

fn default_reconnect_initial_ms() -> u64 {
    500
}

fn default_reconnect_max_ms() -> u64 {
    30_000
}

fn default_reconnect_max_attempts() -> u32 {
    0
}

fn default_max_content_len() -> usize {
    4000
}

fn default_search_limit() -> usize {
    50
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(None),
    }
}

impl ClientConfig {
    /// Build a configuration for `url` with every other setting at its default
    #[must_use]
    pub fn for_server(url: impl Into<String>) -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            server: ServerConfig {
                url: url.into(),
                outbound_buffer: default_outbound_buffer(),
            },
            timeouts: TimeoutConfig {
                join_timeout_ms: default_join_timeout_ms(),
                history_timeout_ms: default_history_timeout_ms(),
                typing_ttl_ms: default_typing_ttl_ms(),
            },
            reconnect: ReconnectConfig {
                initial_delay_ms: default_reconnect_initial_ms(),
                max_delay_ms: default_reconnect_max_ms(),
                max_attempts: default_reconnect_max_attempts(),
            },
            limits: LimitsConfig {
                max_content_len: default_max_content_len(),
                search_result_limit: default_search_limit(),
            },
            snowflake: SnowflakeConfig { worker_id: None },
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `CHAT_SERVER_URL` is missing or a variable does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let url = env::var("CHAT_SERVER_URL").map_err(|_| ConfigError::MissingVar("CHAT_SERVER_URL"))?;
        let mut config = Self::for_server(url);

        if let Ok(name) = env::var("APP_NAME") {
            config.app.name = name;
        }
        if let Ok(raw) = env::var("APP_ENV") {
            config.app.env =
                Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw))?;
        }

        if let Some(v) = parse_var("CHAT_OUTBOUND_BUFFER")? {
            config.server.outbound_buffer = v;
        }
        if let Some(v) = parse_var("CHAT_JOIN_TIMEOUT_MS")? {
            config.timeouts.join_timeout_ms = v;
        }
        if let Some(v) = parse_var("CHAT_HISTORY_TIMEOUT_MS")? {
            config.timeouts.history_timeout_ms = v;
        }
        if let Some(v) = parse_var("CHAT_TYPING_TTL_MS")? {
            config.timeouts.typing_ttl_ms = v;
        }
        if let Some(v) = parse_var("CHAT_RECONNECT_INITIAL_MS")? {
            config.reconnect.initial_delay_ms = v;
        }
        if let Some(v) = parse_var("CHAT_RECONNECT_MAX_MS")? {
            config.reconnect.max_delay_ms = v;
        }
        if let Some(v) = parse_var("CHAT_RECONNECT_MAX_ATTEMPTS")? {
            config.reconnect.max_attempts = v;
        }
        if let Some(v) = parse_var("CHAT_MAX_CONTENT_LEN")? {
            config.limits.max_content_len = v;
        }
        if let Some(v) = parse_var("CHAT_SEARCH_LIMIT")? {
            config.limits.search_result_limit = v;
        }
        if let Some(v) = parse_var::<u16>("WORKER_ID")? {
            if v >= 1024 {
                return Err(ConfigError::InvalidValue("WORKER_ID", v.to_string()));
            }
            config.snowflake.worker_id = Some(v);
        }

        if config.server.outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue("CHAT_OUTBOUND_BUFFER", "0".to_string()));
        }

        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
