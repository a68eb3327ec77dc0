//! Global configuration for autopatch.
//!
//! The global configuration file holds user-wide settings, currently the
//! `[upgrade]` table controlling self-update behavior.
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.autopatch/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\autopatch\config.toml`
//!
//! The location can be overridden with the `AUTOPATCH_CONFIG_PATH` environment
//! variable or the `--config` command-line flag.
//!
//! # File Format
//!
//! ```toml
//! [upgrade]
//! auto_update = true
//! check_interval = 86400
//! metadata_url = "https://s3.amazonaws.com/cli-autoupdates/"
//! http_timeout = 60
//! ```
//!
//! A missing file is not an error: every setting has a default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::upgrade::config::UpgradeSettings;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "AUTOPATCH_CONFIG_PATH";

/// User-wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Self-update settings.
    #[serde(default)]
    pub upgrade: UpgradeSettings,
}

impl GlobalConfig {
    /// Load the configuration from [`default_path`](Self::default_path).
    ///
    /// Returns the defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` if given, otherwise from the default location.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load the configuration from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Write the configuration to `path`, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, self.to_toml()?)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))
    }

    /// Render the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize global config")
    }

    /// Resolve the configuration file location.
    ///
    /// `AUTOPATCH_CONFIG_PATH` wins when set and non-empty; otherwise the
    /// platform default is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or, on Windows, local data) directory
    /// cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("autopatch")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".autopatch")
        };

        Ok(config_dir.join("config.toml"))
    }
}
