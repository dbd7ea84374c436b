//! Configuration module for tablegate.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::{GatewayError, Result};

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/tablegate.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// A single named connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Driver identifier (e.g. "memory").
    pub driver: String,
    /// Namespace model classes for this connection live in.
    #[serde(default = "default_model_namespace")]
    pub model_namespace: String,
    /// Additional names this connection is registered under.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Class namespaces resolved to this connection.
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Driver-specific settings, passed through untouched.
    #[serde(default)]
    pub settings: toml::Table,
}

fn default_model_namespace() -> String {
    "app.models".to_string()
}

impl ConnectionConfig {
    /// Create a connection config for `driver` with default settings.
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            model_namespace: default_model_namespace(),
            aliases: Vec::new(),
            namespaces: Vec::new(),
            settings: toml::Table::new(),
        }
    }

    /// String setting, if present and a string.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(|v| v.as_str())
    }

    /// List-of-strings setting. Non-string entries are skipped.
    pub fn setting_list(&self, key: &str) -> Vec<String> {
        self.settings
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Name of the default connection.
    #[serde(default)]
    pub default_connection: Option<String>,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Connections by name.
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GatewayError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| GatewayError::Configuration(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `TABLEGATE_DEFAULT_CONNECTION`: Override the default connection name
    pub fn apply_env_overrides(&mut self) {
        if let Ok(name) = std::env::var("TABLEGATE_DEFAULT_CONNECTION") {
            if !name.is_empty() {
                self.default_connection = Some(name);
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - a connection has an empty driver identifier
    /// - the default connection names neither a connection nor an alias
    pub fn validate(&self) -> Result<()> {
        for (name, conn) in &self.connections {
            if conn.driver.trim().is_empty() {
                return Err(GatewayError::Configuration(format!(
                    "connection '{name}' has no driver"
                )));
            }
        }

        if let Some(default) = &self.default_connection {
            let known = self.connections.contains_key(default)
                || self
                    .connections
                    .values()
                    .any(|c| c.aliases.iter().any(|a| a == default));
            if !known {
                return Err(GatewayError::Configuration(format!(
                    "default connection '{default}' is not configured"
                )));
            }
        }

        Ok(())
    }
}
