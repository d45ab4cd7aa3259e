//! Configuration loading for the feedsync CLI.
//!
//! Configuration is loaded from a TOML file: `--config <path>` if given,
//! otherwise `feedsync.toml` in the data directory if it exists. Every field
//! has a default, so the file and each of its tables are optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use sync_client::SyncConfig;

/// Name of the configuration file looked up in the data directory.
pub const CONFIG_FILE_NAME: &str = "feedsync.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Remote API configuration.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Local storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Retry and periodic sync configuration.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Base URL of the change-list API (no default: use `--demo` offline).
    pub base_url: Option<String>,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path, relative paths resolve against the data directory
    /// (default: feedsync.db).
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directives; `RUST_LOG` takes precedence (default: info).
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions
fn default_timeout_secs() -> u64 {
    30
}

fn default_database_path() -> PathBuf {
    PathBuf::from("feedsync.db")
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the explicit config file, or the data directory's one if present.
    pub fn load(explicit: Option<&Path>, data_dir: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = data_dir.join(CONFIG_FILE_NAME);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Database path resolved against the data directory.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        if self.storage.database.is_absolute() {
            self.storage.database.clone()
        } else {
            data_dir.join(&self.storage.database)
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}
