use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::config::types::Config;

/// Environment variable that overrides the configured bearer token.
pub const TOKEN_ENV_VAR: &str = "VMCONSOLE_TOKEN";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/vmconsole/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("vmconsole").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    /// - `VMCONSOLE_TOKEN`, when set, replaces the configured token.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Self::parse(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            Config::default()
        };

        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                config.cluster.token = Some(token);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// The API server as a URL.
    pub fn server_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.cluster.server).map_err(|e| ConfigError::ValidationError {
            message: format!("Invalid server URL '{}': {}", self.cluster.server, e),
        })
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The server is an http(s) or ws(s) URL
    /// - The default namespace is not empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = self.server_url()?;
        if !matches!(server.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Server URL '{}' must use http, https, ws or wss",
                    self.cluster.server
                ),
            });
        }

        if self.cluster.namespace.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Namespace must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
