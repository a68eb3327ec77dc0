use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::constants::{CHECKPOINT_FILE, DEV_VERSION};

/// Rate limiter for update checks, persisted across invocations.
///
/// The gate keeps a single RFC3339 timestamp in `{state_dir}/cktime` meaning
/// "do not check again before this instant". It is read at the start of a
/// cycle and rewritten whenever a check actually happens, whatever its
/// outcome, so a failing update server is not hammered on every command.
///
/// # Checkpoint Semantics
///
/// - Missing, unreadable or unparsable file: never checked, always due
/// - `checkpoint <= now`: due
/// - Development builds (`"dev"`): never due
///
/// No lock is taken. Concurrent invocations may race on the file; the worst
/// outcome is one redundant check.
///
/// # Examples
///
/// ```rust,no_run
/// use autopatch_cli::upgrade::UpdateGate;
/// use chrono::Utc;
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let gate = UpdateGate::new(PathBuf::from(".autopatch_update"), "2.5.0", chrono::Duration::hours(24));
/// let now = Utc::now();
/// if gate.should_check(now).await {
///     gate.record_check(now).await?;
///     // ... run the update cycle ...
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UpdateGate {
    path: PathBuf,
    current_version: String,
    interval: Duration,
}

impl UpdateGate {
    /// Create a gate storing its checkpoint in `state_dir`.
    pub fn new(state_dir: PathBuf, current_version: impl Into<String>, interval: Duration) -> Self {
        Self {
            path: state_dir.join(CHECKPOINT_FILE),
            current_version: current_version.into(),
            interval,
        }
    }

    /// Path of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configured gate interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether an unforced check is due at `now`.
    pub async fn should_check(&self, now: DateTime<Utc>) -> bool {
        if self.current_version == DEV_VERSION {
            debug!("Development build, skipping update check");
            return false;
        }

        match self.next_check().await {
            Some(next) if next > now => {
                debug!("Next update check not before {}", next);
                false
            }
            _ => true,
        }
    }

    /// Record that a check happens at `now`; the next one is due at `now + interval`.
    pub async fn record_check(&self, now: DateTime<Utc>) -> Result<()> {
        let next = now.checked_add_signed(self.interval).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.write(next).await
    }

    /// Move the checkpoint into the past so the next [`should_check`](Self::should_check)
    /// returns `true`.
    pub async fn force_due(&self, now: DateTime<Utc>) -> Result<()> {
        let past = now.checked_sub_signed(self.interval).unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.write(past).await
    }

    /// Read the stored checkpoint.
    ///
    /// Returns `None` when the file is missing, unreadable or not a valid
    /// RFC3339 timestamp.
    pub async fn next_check(&self) -> Option<DateTime<Utc>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No usable update checkpoint at {:?}: {}", self.path, e);
                return None;
            }
        };

        match DateTime::parse_from_rfc3339(content.trim()) {
            Ok(t) => Some(t.with_timezone(&Utc)),
            Err(e) => {
                debug!("Ignoring malformed update checkpoint {:?}: {}", content.trim(), e);
                None
            }
        }
    }

    async fn write(&self, at: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create state directory {}", parent.display()))?;
        }

        let content = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write update checkpoint {}", self.path.display()))?;

        debug!("Update checkpoint set to {}", at);
        Ok(())
    }
}
