//! API configuration module.
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values
//! 2. Config file (`stockroom.toml`, or the path in `STOCKROOM_CONFIG`)
//! 3. Environment variables
//!
//! ## Environment Variables
//! | Variable                           | Field                    |
//! |------------------------------------|--------------------------|
//! | `STOCKROOM_BIND_ADDR`              | `bind_addr`              |
//! | `STOCKROOM_PORT`, `PORT`           | `port`                   |
//! | `STOCKROOM_DATABASE_PATH`, `DATABASE_PATH` | `database_path`  |
//! | `STOCKROOM_MAX_CONNECTIONS`        | `max_connections`        |
//! | `STOCKROOM_MIN_CONNECTIONS`        | `min_connections`        |
//! | `STOCKROOM_ACQUIRE_TIMEOUT_SECS`   | `acquire_timeout_secs`   |
//! | `STOCKROOM_OPERATION_TIMEOUT_SECS` | `operation_timeout_secs` |
//! | `STOCKROOM_JWT_SECRET`, `JWT_SECRET` | `jwt_secret`           |
//! | `STOCKROOM_TOKEN_TTL_DAYS`         | `token_ttl_days`         |
//! | `STOCKROOM_COOKIE_SECURE`          | `cookie_secure`          |
//!
//! The `STOCKROOM_` name wins when both spellings are set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use stockroom_db::DbConfig;

const DEFAULT_CONFIG_FILE: &str = "stockroom.toml";

/// Longest session lifetime accepted, ten years.
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// API configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface to listen on
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Upper bound on open connections
    pub max_connections: u32,

    /// Connections kept open while idle
    pub min_connections: u32,

    /// How long a request may wait for a pooled connection
    pub acquire_timeout_secs: u64,

    /// Deadline for a whole service operation
    pub operation_timeout_secs: u64,

    /// HS256 signing secret; required
    pub jwt_secret: String,

    /// Session token lifetime
    pub token_ttl_days: i64,

    /// Add `Secure` to the session cookie (enable behind HTTPS)
    pub cookie_secure: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            database_path: PathBuf::from("stockroom.db"),
            max_connections: 3,
            min_connections: 0,
            acquire_timeout_secs: 5,
            operation_timeout_secs: 10,
            jwt_secret: String::new(),
            token_ttl_days: 30,
            cookie_secure: false,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_days", &self.token_ttl_days)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .or_else(|| std::env::var("STOCKROOM_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            info!(?path, "Loading config from file");
            Self::from_file(&path)?
        } else {
            debug!(?path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies overrides from `lookup` (the process environment in [`Self::load`]).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |primary: &str, fallback: Option<&str>| {
            lookup(primary)
                .map(|v| (primary.to_string(), v))
                .or_else(|| fallback.and_then(|k| lookup(k).map(|v| (k.to_string(), v))))
        };

        if let Some((_, addr)) = get("STOCKROOM_BIND_ADDR", None) {
            self.bind_addr = addr;
        }
        if let Some((key, port)) = get("STOCKROOM_PORT", Some("PORT")) {
            self.port = parse_value(&key, &port)?;
        }
        if let Some((_, path)) = get("STOCKROOM_DATABASE_PATH", Some("DATABASE_PATH")) {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }
        if let Some((key, value)) = get("STOCKROOM_MAX_CONNECTIONS", None) {
            self.max_connections = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("STOCKROOM_MIN_CONNECTIONS", None) {
            self.min_connections = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("STOCKROOM_ACQUIRE_TIMEOUT_SECS", None) {
            self.acquire_timeout_secs = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("STOCKROOM_OPERATION_TIMEOUT_SECS", None) {
            self.operation_timeout_secs = parse_value(&key, &value)?;
        }
        if let Some((_, secret)) = get("STOCKROOM_JWT_SECRET", Some("JWT_SECRET")) {
            self.jwt_secret = secret;
        }
        if let Some((key, value)) = get("STOCKROOM_TOKEN_TTL_DAYS", None) {
            self.token_ttl_days = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("STOCKROOM_COOKIE_SECURE", None) {
            self.cookie_secure = parse_value(&key, &value)?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                "min_connections must not exceed max_connections".to_string(),
            ));
        }
        if self.operation_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "timeouts must be greater than 0".to_string(),
            ));
        }
        if self.token_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "token_ttl_days must be greater than 0".to_string(),
            ));
        }
        if self.token_ttl_days > MAX_TOKEN_TTL_DAYS {
            return Err(ConfigError::InvalidValue(format!(
                "token_ttl_days must not exceed {}",
                MAX_TOKEN_TTL_DAYS
            )));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Address the HTTP server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("bind_addr '{}'", self.bind_addr)))
    }

    /// Pool settings for [`stockroom_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Session lifetime, clamped to `1..=MAX_TOKEN_TTL_DAYS` days.
    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days.clamp(1, MAX_TOKEN_TTL_DAYS))
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{}={}", key, value)))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.token_ttl_days, 30);
        assert_eq!(config.token_lifetime(), chrono::Duration::days(30));
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let config = ApiConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));

        let config = ApiConfig {
            jwt_secret: "   ".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_with_partial_keys() {
        let config = ApiConfig::from_toml_str(
            r#"
            port = 9000
            database_path = "/var/lib/stockroom/data.db"
            jwt_secret = "from-file"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/stockroom/data.db"));
        assert_eq!(config.max_connections, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ApiConfig::from_toml_str("port = \"eighty\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = ApiConfig::from_toml_str("port = 9000\njwt_secret = \"file\"").unwrap();
        config
            .apply_overrides(env(&[
                ("PORT", "7000"),
                ("JWT_SECRET", "env-secret"),
                ("STOCKROOM_MAX_CONNECTIONS", "8"),
                ("STOCKROOM_COOKIE_SECURE", "true"),
            ]))
            .unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.jwt_secret, "env-secret");
        assert_eq!(config.max_connections, 8);
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_prefixed_variable_wins() {
        let mut config = ApiConfig::default();
        config
            .apply_overrides(env(&[("PORT", "7000"), ("STOCKROOM_PORT", "7100")]))
            .unwrap();
        assert_eq!(config.port, 7100);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = ApiConfig::default();
        let err = config
            .apply_overrides(env(&[("STOCKROOM_MAX_CONNECTIONS", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("STOCKROOM_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_pool_bounds_validated() {
        let config = ApiConfig {
            jwt_secret: "s".to_string(),
            min_connections: 5,
            max_connections: 3,
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_ttl_is_bounded() {
        let config = |days| ApiConfig {
            jwt_secret: "s".to_string(),
            token_ttl_days: days,
            ..ApiConfig::default()
        };

        assert!(config(MAX_TOKEN_TTL_DAYS).validate().is_ok());
        let err = config(MAX_TOKEN_TTL_DAYS + 1).validate().unwrap_err();
        assert!(err.to_string().contains("token_ttl_days"));
        assert!(config(i64::MAX).validate().is_err());

        // Never panics, even when unvalidated
        assert_eq!(
            config(i64::MAX).token_lifetime(),
            chrono::Duration::days(MAX_TOKEN_TTL_DAYS)
        );
        assert_eq!(config(-5).token_lifetime(), chrono::Duration::days(1));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ApiConfig {
            jwt_secret: "super-secret".to_string(),
            ..ApiConfig::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_db_config() {
        let config = ApiConfig {
            max_connections: 4,
            acquire_timeout_secs: 2,
            ..ApiConfig::default()
        };
        let db = config.db_config();
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.acquire_timeout, Duration::from_secs(2));
    }
}
