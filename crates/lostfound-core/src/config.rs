//! Configuration for lostfound
//!
//! Read from TOML, every section optional:
//!
//! ```toml
//! [storage]
//! database_path = "/var/lib/lostfound/lostfound.db"
//! criteria_retention_days = 30
//!
//! [intake]
//! allocator_retries = 3
//! default_storage_location = "Service counter"
//!
//! [server]
//! bind_address = "127.0.0.1:3000"
//!
//! [logging]
//! filter = "info,lostfound_core=debug"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LostFoundConfig {
    pub storage: StorageConfig,
    pub intake: IntakeConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Saved screen criteria untouched for this many days are dropped
    pub criteria_retention_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: config_dir()
                .map(|d| d.join("lostfound.db"))
                .unwrap_or_else(|| PathBuf::from("lostfound.db")),
            criteria_retention_days: 30,
        }
    }
}

/// Intake behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Extra attempts when a receipt number turns out to be taken
    pub allocator_retries: u32,
    /// Used when an intake form leaves the storage location blank
    pub default_storage_location: Option<String>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            allocator_retries: 3,
            default_storage_location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when RUST_LOG is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// `~/.lostfound`
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".lostfound"))
}

impl LostFoundConfig {
    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Load `~/.lostfound/config.toml`, or defaults when there is none
    pub fn load_standard() -> Result<Self, ConfigError> {
        match config_dir().map(|d| d.join("config.toml")) {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.bind_address '{}' is not a socket address",
                self.server.bind_address
            )));
        }
        if self.storage.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.database_path must not be empty".to_string(),
            ));
        }
        if self.storage.criteria_retention_days == 0 {
            return Err(ConfigError::Invalid(
                "storage.criteria_retention_days must be at least 1".to_string(),
            ));
        }
        if self
            .intake
            .default_storage_location
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "intake.default_storage_location must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
