//! Application configuration.
//!
//! Loaded from a YAML file with CLI/env overrides applied by the binary.
//! A missing file falls back to defaults so the daemon can run unconfigured.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default feed endpoint (EONET v3 events listing).
pub const DEFAULT_FEED_URL: &str = "https://eonet.gsfc.nasa.gov/api/v3/events";

/// Default result-count limit passed to the feed.
pub const DEFAULT_FEED_LIMIT: u32 = 10;

/// Default feed request timeout.
const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection pool size.
const DEFAULT_POOL_SIZE: u32 = 4;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path.
    pub path: String,

    /// Connection pool size (default: 4).
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "eonetd.db".to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

/// Feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Events-listing endpoint URL.
    pub url: String,

    /// Result-count limit sent as the `limit` query parameter (default: 10).
    pub limit: u32,

    /// Request timeout (default: 10s).
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            limit: DEFAULT_FEED_LIMIT,
            timeout: DEFAULT_FEED_TIMEOUT,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server configuration.
    pub server: ServerConfig,

    /// Database configuration.
    pub database: DatabaseConfig,

    /// Feed configuration.
    pub feed: FeedConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.database.pool_size == 0 {
            return Err(ConfigError::Validation(
                "database pool_size must be positive".to_string(),
            ));
        }

        if self.feed.url.is_empty() {
            return Err(ConfigError::Validation(
                "feed url must not be empty".to_string(),
            ));
        }

        if self.feed.limit == 0 {
            return Err(ConfigError::Validation(
                "feed limit must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "eonetd.db");
        assert_eq!(config.database.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
        assert_eq!(config.feed.limit, DEFAULT_FEED_LIMIT);
        assert_eq!(config.feed.timeout, DEFAULT_FEED_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  bind: "127.0.0.1"
  port: 9090
database:
  path: "data/events.db"
feed:
  limit: 25
  timeout: "5s"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.path, "data/events.db");
        // Unset fields keep their defaults
        assert_eq!(config.database.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
        assert_eq!(config.feed.limit, 25);
        assert_eq!(config.feed.timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_bind_address() {
        let config = AppConfig {
            server: ServerConfig {
                bind: "not-an-ip".to_string(),
                port: 8080,
            },
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("invalid server bind address")
        );
    }

    #[test]
    fn test_validation_zero_port() {
        let config = AppConfig {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_limit() {
        let config = AppConfig {
            feed: FeedConfig {
                limit: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default("definitely/not/here.yaml").unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
