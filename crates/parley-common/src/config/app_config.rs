//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Storage and quota backends are chosen by which URLs are set.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use parley_core::MessageType;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    /// PostgreSQL store; `None` selects the in-memory store
    pub database: Option<DatabaseConfig>,
    /// Redis quota store; `None` selects the in-process store
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub chat: ChatConfig,
    pub rate_limit: RateLimitConfig,
    pub connection: ConnectionConfig,
    /// JSON file of users and rooms loaded into the in-memory store
    pub seed_file: Option<PathBuf>,
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

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations on startup
    #[serde(default)]
    pub run_migrations: bool,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
}

/// Message rules
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Maximum content length in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Type tags a client may send
    #[serde(default = "default_allowed_message_types")]
    pub allowed_message_types: Vec<MessageType>,
    /// How long after creation a message may be edited or deleted
    #[serde(default = "default_edit_window_secs")]
    pub edit_window_secs: u64,
    /// Messages delivered on `join_room`
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
}

impl ChatConfig {
    /// Edit window as a signed duration, saturating at the largest representable span
    #[must_use]
    pub fn edit_window(&self) -> chrono::Duration {
        i64::try_from(self.edit_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    #[must_use]
    pub fn is_type_allowed(&self, message_type: MessageType) -> bool {
        self.allowed_message_types.contains(&message_type)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            allowed_message_types: default_allowed_message_types(),
            edit_window_secs: default_edit_window_secs(),
            history_limit: default_history_limit(),
        }
    }
}

/// Token-bucket limits per operation class
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_message_window_ms")]
    pub message_window_ms: u64,
    #[serde(default = "default_message_max")]
    pub message_max: u32,
    #[serde(default = "default_reaction_window_ms")]
    pub reaction_window_ms: u64,
    #[serde(default = "default_reaction_max")]
    pub reaction_max: u32,
    /// How often expired in-process buckets are swept
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            message_window_ms: default_message_window_ms(),
            message_max: default_message_max(),
            reaction_window_ms: default_reaction_window_ms(),
            reaction_max: default_reaction_max(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Per-connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Outbound queue slots per connection
    #[serde(default = "default_send_buffer")]
    pub send_buffer: usize,
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_heartbeat_timeout_secs")]
    pub heartbeat_timeout_secs: u64,
}

impl ConnectionConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    #[must_use]
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            send_buffer: default_send_buffer(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            heartbeat_timeout_secs: default_heartbeat_timeout_secs(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "parley".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_max_message_length() -> usize {
    5000
}

fn default_allowed_message_types() -> Vec<MessageType> {
    vec![
        MessageType::Text,
        MessageType::Image,
        MessageType::Video,
        MessageType::Audio,
        MessageType::File,
    ]
}

fn default_edit_window_secs() -> u64 {
    86_400 // 24 hours
}

fn default_history_limit() -> i64 {
    50
}

fn default_message_window_ms() -> u64 {
    5000
}

fn default_message_max() -> u32 {
    8
}

fn default_reaction_window_ms() -> u64 {
    10_000
}

fn default_reaction_max() -> u32 {
    10
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_send_buffer() -> usize {
    256
}

fn default_heartbeat_interval_secs() -> u64 {
    25
}

fn default_heartbeat_timeout_secs() -> u64 {
    60
}

/// Read and parse an optional variable, rejecting unparsable values
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

fn parse_message_types(raw: &str) -> Result<Vec<MessageType>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            MessageType::parse(s)
                .ok_or_else(|| ConfigError::InvalidValue("ALLOWED_MESSAGE_TYPES", s.to_string()))
        })
        .collect()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or a
    /// variable holds a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database = match env::var("DATABASE_URL") {
            Ok(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
                run_migrations: parse_var("DATABASE_RUN_MIGRATIONS")?.unwrap_or(false),
            }),
            Err(_) => None,
        };

        let redis = match env::var("REDIS_URL") {
            Ok(url) => Some(RedisConfig {
                url,
                max_connections: parse_var("REDIS_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_redis_max_connections),
            }),
            Err(_) => None,
        };

        let allowed_message_types = match env::var("ALLOWED_MESSAGE_TYPES") {
            Ok(raw) => parse_message_types(&raw)?,
            Err(_) => default_allowed_message_types(),
        };

        Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            gateway: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("GATEWAY_PORT")?.ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?,
            },
            database,
            redis,
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
                access_token_expiry: parse_var("JWT_ACCESS_TOKEN_EXPIRY")?
                    .unwrap_or_else(default_access_token_expiry),
            },
            chat: ChatConfig {
                max_message_length: parse_var("MAX_MESSAGE_LENGTH")?
                    .unwrap_or_else(default_max_message_length),
                allowed_message_types,
                edit_window_secs: parse_var("EDIT_WINDOW_SECS")?
                    .unwrap_or_else(default_edit_window_secs),
                history_limit: parse_var("HISTORY_LIMIT")?.unwrap_or_else(default_history_limit),
            },
            rate_limit: RateLimitConfig {
                message_window_ms: parse_var("RATE_LIMIT_MESSAGE_WINDOW_MS")?
                    .unwrap_or_else(default_message_window_ms),
                message_max: parse_var("RATE_LIMIT_MESSAGE_MAX")?
                    .unwrap_or_else(default_message_max),
                reaction_window_ms: parse_var("RATE_LIMIT_REACTION_WINDOW_MS")?
                    .unwrap_or_else(default_reaction_window_ms),
                reaction_max: parse_var("RATE_LIMIT_REACTION_MAX")?
                    .unwrap_or_else(default_reaction_max),
                sweep_interval_secs: parse_var("RATE_LIMIT_SWEEP_INTERVAL_SECS")?
                    .unwrap_or_else(default_sweep_interval_secs),
            },
            connection: ConnectionConfig {
                send_buffer: parse_var("CONNECTION_SEND_BUFFER")?
                    .unwrap_or_else(default_send_buffer),
                heartbeat_interval_secs: parse_var("HEARTBEAT_INTERVAL_SECS")?
                    .unwrap_or_else(default_heartbeat_interval_secs),
                heartbeat_timeout_secs: parse_var("HEARTBEAT_TIMEOUT_SECS")?
                    .unwrap_or_else(default_heartbeat_timeout_secs),
            },
            seed_file: env::var("PARLEY_SEED_FILE").ok().map(PathBuf::from),
        }
        .validated()
    }

    /// Reject values the runtime cannot work with
    ///
    /// Zero queue sizes and timer periods panic inside tokio, and an edit
    /// window must fit a `chrono::Duration`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        fn positive(name: &'static str, value: u64) -> Result<(), ConfigError> {
            if value == 0 {
                return Err(ConfigError::InvalidValue(name, value.to_string()));
            }
            Ok(())
        }

        let chat = &self.chat;
        positive("MAX_MESSAGE_LENGTH", chat.max_message_length as u64)?;
        positive("EDIT_WINDOW_SECS", chat.edit_window_secs)?;
        if i64::try_from(chat.edit_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .is_none()
        {
            return Err(ConfigError::InvalidValue(
                "EDIT_WINDOW_SECS",
                chat.edit_window_secs.to_string(),
            ));
        }
        if chat.history_limit < 1 {
            return Err(ConfigError::InvalidValue(
                "HISTORY_LIMIT",
                chat.history_limit.to_string(),
            ));
        }

        let limits = &self.rate_limit;
        positive("RATE_LIMIT_MESSAGE_WINDOW_MS", limits.message_window_ms)?;
        positive("RATE_LIMIT_MESSAGE_MAX", u64::from(limits.message_max))?;
        positive("RATE_LIMIT_REACTION_WINDOW_MS", limits.reaction_window_ms)?;
        positive("RATE_LIMIT_REACTION_MAX", u64::from(limits.reaction_max))?;
        positive("RATE_LIMIT_SWEEP_INTERVAL_SECS", limits.sweep_interval_secs)?;

        let conn = &self.connection;
        positive("CONNECTION_SEND_BUFFER", conn.send_buffer as u64)?;
        positive("HEARTBEAT_INTERVAL_SECS", conn.heartbeat_interval_secs)?;
        positive("HEARTBEAT_TIMEOUT_SECS", conn.heartbeat_timeout_secs)?;

        Ok(self)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("PRODUCTION"), Some(Environment::Production));
        assert_eq!(Environment::parse("qa"), None);
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_chat_defaults() {
        let chat = ChatConfig::default();
        assert_eq!(chat.max_message_length, 5000);
        assert_eq!(chat.history_limit, 50);
        assert_eq!(chat.edit_window(), chrono::Duration::hours(24));
        assert!(chat.is_type_allowed(MessageType::Text));
        assert!(chat.is_type_allowed(MessageType::File));
        assert!(!chat.is_type_allowed(MessageType::System));
        assert!(!chat.is_type_allowed(MessageType::Deleted));
    }

    #[test]
    fn test_rate_limit_defaults() {
        let limits = RateLimitConfig::default();
        assert_eq!((limits.message_window_ms, limits.message_max), (5000, 8));
        assert_eq!((limits.reaction_window_ms, limits.reaction_max), (10_000, 10));
    }

    #[test]
    fn test_parse_message_types() {
        let types = parse_message_types("text, image ,").unwrap();
        assert_eq!(types, vec![MessageType::Text, MessageType::Image]);
        assert!(matches!(
            parse_message_types("text,sticker"),
            Err(ConfigError::InvalidValue("ALLOWED_MESSAGE_TYPES", _))
        ));
    }

    fn config() -> AppConfig {
        AppConfig {
            app: AppSettings {
                name: "parley-test".to_string(),
                env: Environment::Development,
            },
            gateway: ServerConfig {
                host: default_host(),
                port: 0,
            },
            database: None,
            redis: None,
            jwt: JwtConfig {
                secret: "secret".to_string(),
                access_token_expiry: default_access_token_expiry(),
            },
            chat: ChatConfig::default(),
            rate_limit: RateLimitConfig::default(),
            connection: ConnectionConfig::default(),
            seed_file: None,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(config().validated().is_ok());
    }

    #[test]
    fn test_zero_timers_and_buffers_rejected() {
        let mut zero_buffer = config();
        zero_buffer.connection.send_buffer = 0;
        assert!(matches!(
            zero_buffer.validated(),
            Err(ConfigError::InvalidValue("CONNECTION_SEND_BUFFER", _))
        ));

        let mut zero_heartbeat = config();
        zero_heartbeat.connection.heartbeat_interval_secs = 0;
        assert!(matches!(
            zero_heartbeat.validated(),
            Err(ConfigError::InvalidValue("HEARTBEAT_INTERVAL_SECS", _))
        ));

        let mut zero_sweep = config();
        zero_sweep.rate_limit.sweep_interval_secs = 0;
        assert!(matches!(
            zero_sweep.validated(),
            Err(ConfigError::InvalidValue("RATE_LIMIT_SWEEP_INTERVAL_SECS", _))
        ));
    }

    #[test]
    fn test_huge_edit_window_rejected() {
        let mut huge = config();
        huge.chat.edit_window_secs = 10_000_000_000_000_000;
        assert!(matches!(
            huge.validated(),
            Err(ConfigError::InvalidValue("EDIT_WINDOW_SECS", _))
        ));
    }

    #[test]
    fn test_edit_window_saturates() {
        let chat = ChatConfig {
            edit_window_secs: u64::MAX,
            ..ChatConfig::default()
        };
        assert_eq!(chat.edit_window(), chrono::Duration::MAX);
    }

    #[test]
    fn test_connection_defaults() {
        let conn = ConnectionConfig::default();
        assert_eq!(conn.send_buffer, 256);
        assert_eq!(conn.heartbeat_interval(), Duration::from_secs(25));
        assert_eq!(conn.heartbeat_timeout(), Duration::from_secs(60));
    }
}
