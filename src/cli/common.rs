//! State shared by command implementations.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::GlobalConfig;
use crate::constants::BUILD_VERSION;
use crate::upgrade::{SelfUpdater, UpdateConfig};
use crate::utils::progress::{ProgressBar, spinner_with_message};

/// Loaded configuration plus per-invocation flags.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The global configuration in effect.
    pub global: GlobalConfig,
    /// Configuration file given with `--config`, if any.
    pub config_path: Option<PathBuf>,
    /// Whether spinners may be drawn.
    pub progress: bool,
}

impl CommandContext {
    /// Bundle the loaded configuration with the invocation flags.
    pub fn new(global: GlobalConfig, config_path: Option<PathBuf>, progress: bool) -> Self {
        Self {
            global,
            config_path,
            progress,
        }
    }

    /// Build an updater for the running executable.
    pub fn updater(&self) -> Result<SelfUpdater> {
        let config = UpdateConfig::from_settings(&self.global.upgrade, BUILD_VERSION)
            .context("Failed to configure the updater")?;
        SelfUpdater::new(config).context("Failed to create the updater")
    }

    /// Effective configuration file path.
    pub fn resolved_config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => GlobalConfig::default_path(),
        }
    }

    /// A spinner honoring `--no-progress`.
    pub fn spinner(&self, msg: impl Into<String>) -> ProgressBar {
        spinner_with_message(msg, self.progress)
    }
}
