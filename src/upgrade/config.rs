use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    COMMAND_NAME, DEFAULT_BINARY_URL, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_METADATA_URL, DEFAULT_PATCH_URL, DEFAULT_STATE_DIR,
};
use crate::core::UpdateError;
use crate::upgrade::platform;

/// Persisted settings controlling self-update behavior.
///
/// `UpgradeSettings` is the `[upgrade]` table of the global configuration file.
/// Every key is optional; missing keys fall back to the defaults below.
///
/// # Default Behavior
///
/// - Opportunistic update checks before each command (`auto_update = true`)
/// - At most one unforced check every 24 hours
/// - The public update bucket for metadata, patches and full binaries
/// - State kept in `.autopatch_update` next to the executable
///
/// # TOML Example
/// ```toml
/// [upgrade]
/// auto_update = true
/// check_interval = 86400
/// metadata_url = "https://updates.example.com/"
/// binary_url = "https://updates.example.com/"
/// patch_url = "https://updates.example.com/"
/// state_dir = "~/.autopatch/state"
/// http_timeout = 60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeSettings {
    /// Whether to run a gated update check before ordinary commands.
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,

    /// Gate interval in seconds between unforced checks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Base URL for version metadata documents.
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// Base URL for gzip-compressed full binaries.
    #[serde(default = "default_binary_url")]
    pub binary_url: String,

    /// Base URL for binary delta patches.
    #[serde(default = "default_patch_url")]
    pub patch_url: String,

    /// Directory holding the checkpoint file. `~` and environment variables
    /// are expanded. Defaults to `.autopatch_update` beside the executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            auto_update: default_auto_update(),
            check_interval: default_check_interval(),
            metadata_url: default_metadata_url(),
            binary_url: default_binary_url(),
            patch_url: default_patch_url(),
            state_dir: None,
            http_timeout: default_http_timeout(),
        }
    }
}

fn default_auto_update() -> bool {
    true
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_metadata_url() -> String {
    DEFAULT_METADATA_URL.to_string()
}

fn default_binary_url() -> String {
    DEFAULT_BINARY_URL.to_string()
}

fn default_patch_url() -> String {
    DEFAULT_PATCH_URL.to_string()
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Immutable per-run configuration of the updater.
///
/// Built once, from [`UpgradeSettings`] and the running process, and passed by
/// reference to every component of an update cycle. Nothing in it changes
/// while a cycle runs.
///
/// # Examples
///
/// ```rust,no_run
/// use autopatch_cli::upgrade::config::{UpdateConfig, UpgradeSettings};
///
/// # fn example() -> Result<(), autopatch_cli::core::UpdateError> {
/// let config = UpdateConfig::from_settings(&UpgradeSettings::default(), "1.2.0")?;
/// println!("checking {} for {}", config.metadata_url(), config.platform_tag);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Version of the running binary.
    pub current_version: String,
    /// Base URL for version metadata.
    pub metadata_base_url: String,
    /// Base URL for full binaries.
    pub binary_base_url: String,
    /// Base URL for delta patches.
    pub patch_base_url: String,
    /// Directory holding the checkpoint file.
    pub state_dir: PathBuf,
    /// Command name appended to every base URL.
    pub command_name: String,
    /// `{os}-{arch}` tag of the running platform, e.g. `linux-amd64`.
    pub platform_tag: String,
    /// Path of the executable that gets patched and replaced.
    pub executable: PathBuf,
    /// Minimum time between unforced checks.
    pub check_interval: Duration,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl UpdateConfig {
    /// Build the runtime configuration for the currently running executable.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Config`] if the executable path cannot be
    /// determined or `state_dir` cannot be expanded.
    pub fn from_settings(
        settings: &UpgradeSettings,
        current_version: impl Into<String>,
    ) -> Result<Self, UpdateError> {
        let executable = current_executable()?;
        Self::for_executable(settings, current_version, executable)
    }

    /// Build the runtime configuration for an explicit executable path.
    ///
    /// Used when embedding the updater or in tests, where the binary being
    /// replaced is not the running process.
    pub fn for_executable(
        settings: &UpgradeSettings,
        current_version: impl Into<String>,
        executable: PathBuf,
    ) -> Result<Self, UpdateError> {
        let state_dir = match &settings.state_dir {
            Some(dir) => expand_path(dir)?,
            None => default_state_dir(&executable),
        };

        Ok(Self {
            current_version: current_version.into(),
            metadata_base_url: settings.metadata_url.clone(),
            binary_base_url: settings.binary_url.clone(),
            patch_base_url: settings.patch_url.clone(),
            state_dir,
            command_name: COMMAND_NAME.to_string(),
            platform_tag: platform::platform_tag(),
            executable,
            check_interval: Duration::from_secs(settings.check_interval),
            http_timeout: Duration::from_secs(settings.http_timeout),
        })
    }

    /// Override the state directory.
    pub fn with_state_dir(mut self, state_dir: PathBuf) -> Self {
        self.state_dir = state_dir;
        self
    }

    /// Override the command name.
    pub fn with_command_name(mut self, command_name: impl Into<String>) -> Self {
        self.command_name = command_name.into();
        self
    }

    /// `{metadata_base_url}/{cmd}/{platform}.json`
    pub fn metadata_url(&self) -> String {
        format!(
            "{}/{}/{}.json",
            trim_base(&self.metadata_base_url),
            self.command_name,
            self.platform_tag
        )
    }

    /// `{patch_base_url}/{cmd}/{from}/{to}/{platform}`
    pub fn patch_url(&self, from_version: &str, to_version: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            trim_base(&self.patch_base_url),
            self.command_name,
            from_version,
            to_version,
            self.platform_tag
        )
    }

    /// `{binary_base_url}/{cmd}/{version}/{platform}.gz`
    pub fn binary_url(&self, version: &str) -> String {
        format!(
            "{}/{}/{}/{}.gz",
            trim_base(&self.binary_base_url),
            self.command_name,
            version,
            self.platform_tag
        )
    }
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

fn current_executable() -> Result<PathBuf, UpdateError> {
    let exe = std::env::current_exe().map_err(|e| UpdateError::Config {
        message: format!("cannot determine current executable: {e}"),
    })?;
    // Replace the real file, not a symlink pointing at it
    Ok(exe.canonicalize().unwrap_or(exe))
}

fn default_state_dir(executable: &Path) -> PathBuf {
    executable
        .parent()
        .map(|dir| dir.join(DEFAULT_STATE_DIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

fn expand_path(raw: &str) -> Result<PathBuf, UpdateError> {
    shellexpand::full(raw).map(|s| PathBuf::from(s.as_ref())).map_err(|e| UpdateError::Config {
        message: format!("cannot expand state_dir '{raw}': {e}"),
    })
}
