//! Server configuration
//!
//! Loaded from an optional TOML file. Every field has a default, so a
//! partial file (or no file at all) yields a working configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Listener and connection lifecycle settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the TCP listener to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Log the user out and drop its endpoint binding when its connection closes
    #[serde(default = "default_true")]
    pub release_on_disconnect: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            release_on_disconnect: true,
        }
    }
}

/// Per-connection resource limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Longest accepted input line in bytes, excluding the newline
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Capacity of each connection's outbound queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// Upper bound for a single broadcast delivery
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
}

impl LimitsConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            outbound_buffer: default_outbound_buffer(),
            delivery_timeout_ms: default_delivery_timeout_ms(),
        }
    }
}

/// Login behaviour
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Reject a repeat login whose password differs from the registered one
    #[serde(default)]
    pub verify_password_on_relogin: bool,
}

fn default_true() -> bool {
    true
}

fn default_listen() -> String {
    "127.0.0.1:1234".to_string()
}

fn default_max_line_length() -> usize {
    4096
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_delivery_timeout_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:1234");
        assert!(config.server.release_on_disconnect);
        assert_eq!(config.limits.max_line_length, 4096);
        assert_eq!(config.limits.delivery_timeout(), Duration::from_secs(5));
        assert!(!config.auth.verify_password_on_relogin);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            [server]
            listen = "0.0.0.0:9000"

            [auth]
            verify_password_on_relogin = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert!(config.server.release_on_disconnect);
        assert_eq!(config.limits.outbound_buffer, 64);
        assert!(config.auth.verify_password_on_relogin);
    }

    #[test]
    fn test_invalid_config() {
        let result = Config::parse("[limits]\nmax_line_length = \"big\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
