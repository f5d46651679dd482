//! TOML Configuration File Support
//!
//! Centralized configuration loading for the stream client, supporting a
//! TOML configuration file at `~/.config/newswire/client.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. Environment variables (`NEWSWIRE_*`)
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! ws_base = "wss://gateway.example.com"
//! http_base = "https://gateway.example.com"
//! backlog = 100
//! channel_capacity = 100
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Raw TOML configuration file contents.
///
/// Every field is optional; absent fields keep their defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// WebSocket base URL of the gateway
    pub ws_base: Option<String>,
    /// HTTP base URL of the gateway (profile lookups)
    pub http_base: Option<String>,
    /// Backlog size requested on connect (omit to disable)
    pub backlog: Option<u32>,
    /// Capacity of the transport event channel
    pub channel_capacity: Option<usize>,
}

/// Resolved client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket base URL of the gateway, e.g. `ws://127.0.0.1:8000`.
    pub ws_base: String,
    /// HTTP base URL of the gateway, e.g. `http://127.0.0.1:8000`.
    pub http_base: String,
    /// Backlog size the server is asked to replay on connect.
    pub backlog: Option<u32>,
    /// Capacity of the channel carrying transport events to the consumer.
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_base: "ws://127.0.0.1:8000".to_string(),
            http_base: "http://127.0.0.1:8000".to_string(),
            backlog: None,
            channel_capacity: 100,
        }
    }
}

/// Default configuration file path under the XDG config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("newswire").join("client.toml"))
}

/// Load and parse a TOML configuration file.
pub fn load_config_from_path(path: &Path) -> Result<ClientToml, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&contents)?)
}

impl ClientConfig {
    /// Load configuration: defaults, then the XDG config file if present,
    /// then environment overrides.
    ///
    /// An unreadable or unparsable config file is logged and skipped rather
    /// than treated as fatal.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(path) = default_config_path() {
            if path.exists() {
                match load_config_from_path(&path) {
                    Ok(file) => config.apply_file(&file),
                    Err(e) => warn!(error = %e, "ignoring config file"),
                }
            }
        }
        config.apply_env();
        config
    }

    /// Apply values from a parsed config file.
    pub fn apply_file(&mut self, file: &ClientToml) {
        if let Some(ws_base) = &file.ws_base {
            self.ws_base.clone_from(ws_base);
        }
        if let Some(http_base) = &file.http_base {
            self.http_base.clone_from(http_base);
        }
        if let Some(backlog) = file.backlog {
            self.backlog = Some(backlog);
        }
        if let Some(capacity) = file.channel_capacity {
            self.channel_capacity = capacity;
        }
    }

    /// Apply `NEWSWIRE_*` environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(ws_base) = std::env::var("NEWSWIRE_WS_BASE") {
            self.ws_base = ws_base;
        }
        if let Ok(http_base) = std::env::var("NEWSWIRE_HTTP_BASE") {
            self.http_base = http_base;
        }
        if let Some(backlog) = std::env::var("NEWSWIRE_BACKLOG")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.backlog = Some(backlog);
        }
        if let Some(capacity) = std::env::var("NEWSWIRE_CHANNEL_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.channel_capacity = capacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.ws_base, "ws://127.0.0.1:8000");
        assert_eq!(config.http_base, "http://127.0.0.1:8000");
        assert_eq!(config.backlog, None);
        assert_eq!(config.channel_capacity, 100);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "ws_base = \"wss://gw.example\"\nbacklog = 50\nchannel_capacity = 32"
        )
        .unwrap();

        let parsed = load_config_from_path(file.path()).unwrap();
        let mut config = ClientConfig::default();
        config.apply_file(&parsed);

        assert_eq!(config.ws_base, "wss://gw.example");
        assert_eq!(config.backlog, Some(50));
        assert_eq!(config.channel_capacity, 32);
        // Untouched fields keep defaults
        assert_eq!(config.http_base, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let err = load_config_from_path(Path::new("/nonexistent/newswire.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_invalid_toml_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ws_base = [not toml").unwrap();
        let err = load_config_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_env_overrides() {
        // The only test touching process environment; vars are cleared before exit.
        std::env::set_var("NEWSWIRE_WS_BASE", "ws://env.example");
        std::env::set_var("NEWSWIRE_BACKLOG", "25");

        let mut config = ClientConfig::default();
        config.apply_env();

        std::env::remove_var("NEWSWIRE_WS_BASE");
        std::env::remove_var("NEWSWIRE_BACKLOG");

        assert_eq!(config.ws_base, "ws://env.example");
        assert_eq!(config.backlog, Some(25));
    }
}
