//! # API Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPFLOOR_PORT=8080                                                │
//! │     SHOPFLOOR_DB_PATH=/var/lib/shopfloor/shopfloor.db                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $SHOPFLOOR_CONFIG, or                                              │
//! │     ~/.config/shopfloor-pos/api.toml (Linux)                           │
//! │     ~/Library/Application Support/com.shopfloor.pos/api.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "./shopfloor.db"
//! max_connections = 8
//! busy_timeout_secs = 5
//!
//! [notifications]
//! enabled = true
//! gateway_url = "https://push.example.com/v1/send"
//! server_key = "..."
//! low_stock_threshold = 2
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use shopfloor_db::DbConfig;
use shopfloor_notify::NotifyConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SHOPFLOOR_CONFIG";

// =============================================================================
// Sections
// =============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns `bind_addr:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size. Reads run in parallel; writers queue on the busy timeout.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a sale waits for the write lock before failing as busy.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shopfloor.db")
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl DatabaseSettings {
    /// Builds the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub notifications: NotifyConfig,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$SHOPFLOOR_CONFIG`, or the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading API config from file");
                let contents = std::fs::read_to_string(&path)?;
                Self::from_toml(&contents)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing tables and keys take their defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `SHOPFLOOR_*` overrides read through `var`.
    ///
    /// Takes a lookup function so tests can feed values without touching
    /// the process environment.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = var("SHOPFLOOR_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = var("SHOPFLOOR_PORT") {
            self.server.port = parse("SHOPFLOOR_PORT", &port)?;
            debug!(port = self.server.port, "Overriding port from environment");
        }

        if let Some(path) = var("SHOPFLOOR_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("SHOPFLOOR_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse("SHOPFLOOR_DB_MAX_CONNECTIONS", &max)?;
        }

        if let Some(enabled) = var("SHOPFLOOR_PUSH_ENABLED") {
            self.notifications.enabled = parse("SHOPFLOOR_PUSH_ENABLED", &enabled)?;
        }

        if let Some(url) = var("SHOPFLOOR_PUSH_URL") {
            self.notifications.gateway_url = Some(url);
        }

        if let Some(key) = var("SHOPFLOOR_PUSH_KEY") {
            self.notifications.server_key = Some(key);
        }

        if let Some(threshold) = var("SHOPFLOOR_LOW_STOCK_THRESHOLD") {
            self.notifications.low_stock_threshold =
                parse("SHOPFLOOR_LOW_STOCK_THRESHOLD", &threshold)?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_addr.trim().is_empty() {
            return Err(ConfigError::InvalidValue("server.bind_addr".into()));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database.path".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        self.notifications
            .validate()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shopfloor", "pos")
            .map(|dirs| dirs.config_dir().join("api.toml"))
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{}={}", key, value)))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
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
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.notifications.low_stock_threshold, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = ApiConfig::from_toml(
            r#"
            [server]
            port = 9090

            [notifications]
            enabled = true
            gateway_url = "http://localhost:4000/push"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("./shopfloor.db"));
        assert!(config.notifications.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        assert!(matches!(
            ApiConfig::from_toml("[server]\nport = \"eighty\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = ApiConfig::from_toml("[server]\nport = 9090").unwrap();
        config
            .apply_overrides(env(&[
                ("SHOPFLOOR_PORT", "7000"),
                ("SHOPFLOOR_DB_PATH", "/tmp/till.db"),
                ("SHOPFLOOR_LOW_STOCK_THRESHOLD", "5"),
                ("SHOPFLOOR_PUSH_ENABLED", "true"),
                ("SHOPFLOOR_PUSH_URL", "https://push.example.com"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.database.path, PathBuf::from("/tmp/till.db"));
        assert_eq!(config.notifications.low_stock_threshold, 5);
        assert!(config.notifications.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparseable_env_value_is_rejected() {
        let mut config = ApiConfig::default();
        let err = config
            .apply_overrides(env(&[("SHOPFLOOR_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(err.to_string().contains("SHOPFLOOR_PORT"));
    }

    #[test]
    fn test_push_enabled_without_gateway_fails_validation() {
        let mut config = ApiConfig::default();
        config
            .apply_overrides(env(&[("SHOPFLOOR_PUSH_ENABLED", "true")]))
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_connections_rejected() {
        let mut config = ApiConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
