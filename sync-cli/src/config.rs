//! Configuration loading for syncwatch.
//!
//! Configuration is loaded from a TOML file (default: `syncwatch.toml` in the
//! platform config directory). A missing default file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use syncwatch_core::ModelConfig;

/// Root configuration for syncwatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Model configuration.
    #[serde(default)]
    pub model: ModelConfig,
}

impl CliConfig {
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

    /// Load the explicit file if given, else the default file if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `syncwatch.toml` in the user's config directory, if one can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "syncwatch", "syncwatch")
        .map(|dirs| dirs.config_dir().join("syncwatch.toml"))
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
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
