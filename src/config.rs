//! Application configuration.
//!
//! Loaded once at startup from a TOML file and read-only thereafter.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration value for '{key}'")]
    Invalid { key: &'static str },
}

/// Serial connection settings for both UART links.
#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// Device path of the inbound link.
    pub read: String,
    /// Device path of the outbound link.
    pub write: String,
    pub baud_rate: u32,
}

/// Behavior switches for a run.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Observations required before the recognizer commits a slot color.
    pub confidence: u32,
    /// Seconds until the default layout replaces an unfinished recognition.
    pub recognition_timeout_secs: u64,
    #[serde(default)]
    pub efficiency_mode: bool,
    #[serde(default)]
    pub fast_mode: bool,
    #[serde(default)]
    pub incremental_build: bool,
}

/// The configuration for the application.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfiguration {
    pub serial: SerialConfig,
    pub app: AppSettings,
}

impl AppConfiguration {
    /// Reads, parses, and validates the configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value; reports the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.read.trim().is_empty() {
            return Err(ConfigError::Invalid { key: "serial.read" });
        }
        if self.serial.write.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "serial.write",
            });
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid {
                key: "serial.baud_rate",
            });
        }
        if self.app.confidence == 0 {
            return Err(ConfigError::Invalid {
                key: "app.confidence",
            });
        }
        if self.app.recognition_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "app.recognition_timeout_secs",
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
