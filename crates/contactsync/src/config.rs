//! Configuration management for contactsync.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "contactsync";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CONTACTSYNC_`)
/// 2. TOML config file at `~/.config/contactsync/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote collection configuration.
    pub remote: RemoteConfig,
    /// Sync/state-holder configuration.
    pub sync: SyncConfig,
    /// Diagnostics configuration.
    pub diagnostics: DiagnosticsConfig,
}

/// Remote-collection-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Name of the remote collection holding contact documents.
    pub collection: String,
    /// Per-subscriber buffer of undelivered listener errors. Snapshot pushes
    /// coalesce to the newest and never queue.
    pub snapshot_buffer: usize,
}

/// State-holder related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Capacity of the bounded mutation queue.
    pub mutation_queue_capacity: usize,
    /// Capacity of the observable write-error channel.
    pub error_queue_capacity: usize,
}

/// Diagnostics-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Report swallowed subscription errors to the crash sink.
    pub report_errors: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            collection: "contacts".to_string(),
            snapshot_buffer: 64,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mutation_queue_capacity: 32,
            error_queue_capacity: 32,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            report_errors: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `CONTACTSYNC_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("CONTACTSYNC_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.remote.collection.is_empty() {
            return Err(Error::ConfigValidation {
                message: "remote.collection must not be empty".to_string(),
            });
        }

        if self.remote.snapshot_buffer == 0 {
            return Err(Error::ConfigValidation {
                message: "remote.snapshot_buffer must be greater than 0".to_string(),
            });
        }

        if self.sync.mutation_queue_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "sync.mutation_queue_capacity must be greater than 0".to_string(),
            });
        }

        if self.sync.error_queue_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "sync.error_queue_capacity must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
