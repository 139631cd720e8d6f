//! Server configuration.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::store::DEFAULT_LIST_LIMIT;

/// Environment variable that overrides [`ServerConfig::database_path`].
pub const DATABASE_ENV: &str = "KNIGHT_SWAP_DB";

/// Configuration for the REST server and local stores.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database file, created if missing.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Maximum sessions returned by a listing.
    #[serde(default = "default_list_limit")]
    list_limit: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> String {
    "knight_swap.db".to_string()
}

fn default_list_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            list_limit: default_list_limit(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file; missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(port = config.port, database_path = %config.database_path, "Config loaded");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.list_limit == 0 {
            return Err(ConfigError::new("list_limit must be at least 1".to_string()));
        }
        Ok(config)
    }

    /// Loads the file if given, otherwise defaults, then applies `KNIGHT_SWAP_DB`.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_database_path(std::env::var(DATABASE_ENV).ok()))
    }

    /// Replaces the host when one is given.
    pub fn with_host(mut self, host: Option<String>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        self
    }

    /// Replaces the port when one is given.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Replaces the database path when a non-blank one is given.
    pub fn with_database_path(mut self, path: Option<String>) -> Self {
        if let Some(path) = path.filter(|p| !p.trim().is_empty()) {
            debug!(path = %path, "Database path overridden");
            self.database_path = path;
        }
        self
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.port(), 3000);
        assert_eq!(config.database_path(), "knight_swap.db");
        assert_eq!(*config.list_limit(), 100);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = ServerConfig::from_toml("port = 8080\ndatabase_path = \"games.db\"\n").unwrap();
        assert_eq!(*config.port(), 8080);
        assert_eq!(config.database_path(), "games.db");
        assert_eq!(config.host(), "127.0.0.1");
    }

    #[test]
    fn test_zero_list_limit_rejected() {
        let err = ServerConfig::from_toml("list_limit = 0").unwrap_err();
        assert!(err.message.contains("list_limit"));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::default()
            .with_host(Some("0.0.0.0".to_string()))
            .with_port(None)
            .with_database_path(Some("  ".to_string()))
            .with_database_path(Some("other.db".to_string()));
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(*config.port(), 3000);
        assert_eq!(config.database_path(), "other.db");
    }

    #[test]
    fn test_missing_file() {
        let err = ServerConfig::from_file("/nonexistent/knight_swap.toml").unwrap_err();
        assert!(err.message.contains("Failed to read config file"));
    }
}
