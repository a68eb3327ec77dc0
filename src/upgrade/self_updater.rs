use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::constants::DEV_VERSION;
use crate::core::UpdateError;
use crate::upgrade::checkpoint::UpdateGate;
use crate::upgrade::config::UpdateConfig;
use crate::upgrade::install::Installer;
use crate::upgrade::metadata::VersionInfo;
use crate::upgrade::patch::read_executable;
use crate::upgrade::source::{HttpUpdateSource, UpdateSource};
use crate::upgrade::verification::ChecksumVerifier;

/// Stage of an update cycle.
///
/// ```text
/// Checking -> PatchAttempt -> Verifying -> Installing -> Done
///                  |              |
///                  v              v (patch digest mismatch)
///           FullFetchAttempt -> Verifying -> Installing -> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching remote metadata and comparing versions.
    Checking,
    /// Reconstructing the new binary from a delta patch.
    PatchAttempt,
    /// Downloading the full compressed binary.
    FullFetchAttempt,
    /// Checking the candidate bytes against the published digest.
    Verifying,
    /// Writing the verified bytes over the executable.
    Installing,
    /// The cycle finished.
    Done,
}

/// Which retrieval tier produced the installed binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOrigin {
    /// Reconstructed from a delta patch.
    Patch,
    /// Downloaded as a full gzip-compressed binary.
    Full,
}

/// Result of one retrieval or verification tier.
#[derive(Debug)]
pub enum TierOutcome<T> {
    /// The tier produced its value.
    Success(T),
    /// The tier failed; the cycle moves on or stops quietly.
    Recoverable(UpdateError),
    /// The tier failed in a way the caller must hear about.
    Fatal(UpdateError),
}

/// How an update cycle ended, when it did not end in an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No check was made: the gate is closed or this is a development build.
    Skipped,
    /// The server advertises the version already running.
    UpToDate {
        /// The current (and latest) version.
        version: String,
    },
    /// A new binary was verified and installed. It runs from the next launch.
    Updated {
        /// Version that was running.
        from: String,
        /// Version now installed.
        to: String,
        /// Tier that produced the installed bytes.
        via: PayloadOrigin,
    },
    /// The cycle stopped at `stage`; the executable was not touched.
    Aborted {
        /// Stage that failed.
        stage: Stage,
        /// The failure, kept for logging and display.
        error: UpdateError,
    },
}

enum Step {
    Checking,
    PatchAttempt(VersionInfo),
    FullFetchAttempt(VersionInfo),
    Verifying(VersionInfo, Vec<u8>, PayloadOrigin),
    Installing(VersionInfo, Vec<u8>, PayloadOrigin),
    Done(CycleOutcome),
}

impl Step {
    fn stage(&self) -> Stage {
        match self {
            Self::Checking => Stage::Checking,
            Self::PatchAttempt(_) => Stage::PatchAttempt,
            Self::FullFetchAttempt(_) => Stage::FullFetchAttempt,
            Self::Verifying(..) => Stage::Verifying,
            Self::Installing(..) => Stage::Installing,
            Self::Done(_) => Stage::Done,
        }
    }
}

/// Drives update cycles for one executable.
///
/// `SelfUpdater` owns everything a cycle needs: the immutable [`UpdateConfig`],
/// the [`UpdateGate`] rate limiter, the [`Installer`] for the executable and an
/// [`UpdateSource`] for remote data. It is constructed explicitly and passed to
/// whoever needs it; there is no process-wide instance.
///
/// # Retrieval Tiers
///
/// A cycle first tries to rebuild the new binary by applying a delta patch to
/// the running executable. Any failure of that tier, including a digest
/// mismatch of the patched result, falls back to downloading the full binary
/// exactly once. Only a digest mismatch of the full binary, or a failure to
/// write the executable, is returned as an error; other failures end the cycle
/// with [`CycleOutcome::Aborted`] and the executable untouched.
///
/// # Examples
///
/// ```rust,no_run
/// use autopatch_cli::upgrade::{CycleOutcome, SelfUpdater, UpdateConfig, UpgradeSettings};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = UpdateConfig::from_settings(&UpgradeSettings::default(), "2.5.0")?;
/// let updater = SelfUpdater::new(config)?;
///
/// match updater.check_and_apply().await? {
///     CycleOutcome::Updated { to, .. } => println!("Updated to {to}, restart to use it"),
///     other => println!("{other:?}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SelfUpdater<S = HttpUpdateSource> {
    config: UpdateConfig,
    gate: UpdateGate,
    installer: Installer,
    source: S,
}

impl SelfUpdater<HttpUpdateSource> {
    /// Create an updater talking to the HTTP endpoints in `config`.
    pub fn new(config: UpdateConfig) -> Result<Self, UpdateError> {
        let source = HttpUpdateSource::new(config.clone())?;
        Ok(Self::with_source(config, source))
    }
}

impl<S: UpdateSource> SelfUpdater<S> {
    /// Create an updater with a custom remote source.
    pub fn with_source(config: UpdateConfig, source: S) -> Self {
        let interval = chrono::Duration::from_std(config.check_interval)
            .unwrap_or_else(|_| chrono::Duration::days(36_500));
        let gate =
            UpdateGate::new(config.state_dir.clone(), config.current_version.clone(), interval);
        let installer = Installer::new(config.executable.clone());

        Self {
            config,
            gate,
            installer,
            source,
        }
    }

    /// Version of the running binary.
    pub fn current_version(&self) -> &str {
        &self.config.current_version
    }

    /// The runtime configuration.
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// The check-rate gate.
    pub fn gate(&self) -> &UpdateGate {
        &self.gate
    }

    /// The remote source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the latest published version without touching the gate or the
    /// executable.
    pub async fn fetch_latest(&self) -> Result<VersionInfo, UpdateError> {
        self.source.fetch_info().await
    }

    /// Run a cycle if the gate allows it.
    ///
    /// Cheap to call before every command: when the gate is closed no network
    /// request is made.
    pub async fn check_and_apply(&self) -> Result<CycleOutcome, UpdateError> {
        self.check_and_apply_at(Utc::now()).await
    }

    /// [`check_and_apply`](Self::check_and_apply) with an explicit clock.
    pub async fn check_and_apply_at(&self, now: DateTime<Utc>) -> Result<CycleOutcome, UpdateError> {
        if !self.gate.should_check(now).await {
            return Ok(CycleOutcome::Skipped);
        }

        // Record first so a failing server is not retried until the interval passes
        if let Err(e) = self.gate.record_check(now).await {
            debug!("Skipping update check, cannot record checkpoint: {:#}", e);
            return Ok(CycleOutcome::Skipped);
        }

        self.run_cycle().await
    }

    /// Reopen the gate and run one cycle immediately.
    pub async fn force_upgrade(&self) -> Result<CycleOutcome, UpdateError> {
        self.force_upgrade_at(Utc::now()).await
    }

    /// [`force_upgrade`](Self::force_upgrade) with an explicit clock.
    pub async fn force_upgrade_at(&self, now: DateTime<Utc>) -> Result<CycleOutcome, UpdateError> {
        if self.current_version() == DEV_VERSION {
            debug!("Development build, not updating");
            return Ok(CycleOutcome::Skipped);
        }

        if let Err(e) = self.gate.force_due(now).await {
            warn!("Cannot reset update checkpoint: {:#}", e);
        }
        if let Err(e) = self.gate.record_check(now).await {
            warn!("Cannot record update checkpoint: {:#}", e);
        }

        self.run_cycle().await
    }

    async fn run_cycle(&self) -> Result<CycleOutcome, UpdateError> {
        let mut step = Step::Checking;

        loop {
            debug!("Update cycle stage: {:?}", step.stage());

            step = match step {
                Step::Checking => match self.source.fetch_info().await {
                    Err(error) => {
                        warn!("Update check failed: {}", error);
                        Step::Done(CycleOutcome::Aborted {
                            stage: Stage::Checking,
                            error,
                        })
                    }
                    Ok(info) if info.version == self.config.current_version => {
                        debug!("Already on latest version {}", info.version);
                        Step::Done(CycleOutcome::UpToDate {
                            version: info.version,
                        })
                    }
                    Ok(info) => {
                        info!("Update available: {} -> {}", self.current_version(), info.version);
                        self.installer.probe()?;
                        Step::PatchAttempt(info)
                    }
                },

                Step::PatchAttempt(info) => match self.patch_tier(&info).await {
                    TierOutcome::Success(bytes) => Step::Verifying(info, bytes, PayloadOrigin::Patch),
                    TierOutcome::Recoverable(e) | TierOutcome::Fatal(e) => {
                        debug!("Patch update unavailable, falling back to full binary: {}", e);
                        Step::FullFetchAttempt(info)
                    }
                },

                Step::FullFetchAttempt(info) => match self.full_tier(&info).await {
                    TierOutcome::Success(bytes) => Step::Verifying(info, bytes, PayloadOrigin::Full),
                    TierOutcome::Recoverable(error) => {
                        warn!("Full binary download failed: {}", error);
                        Step::Done(CycleOutcome::Aborted {
                            stage: Stage::FullFetchAttempt,
                            error,
                        })
                    }
                    TierOutcome::Fatal(error) => return Err(error),
                },

                Step::Verifying(info, bytes, origin) => match verify(&info, &bytes, origin) {
                    TierOutcome::Success(()) => Step::Installing(info, bytes, origin),
                    TierOutcome::Recoverable(e) => {
                        warn!("{}; attempting full binary replacement", e);
                        Step::FullFetchAttempt(info)
                    }
                    TierOutcome::Fatal(error) => {
                        warn!("{}", error);
                        return Err(error);
                    }
                },

                Step::Installing(info, bytes, via) => {
                    self.installer.install(&bytes)?;
                    info!(
                        "Updated {} -> {} ({:?}); restart to use the new version",
                        self.current_version(),
                        info.version,
                        via
                    );
                    Step::Done(CycleOutcome::Updated {
                        from: self.config.current_version.clone(),
                        to: info.version,
                        via,
                    })
                }

                Step::Done(outcome) => return Ok(outcome),
            };
        }
    }

    async fn patch_tier(&self, info: &VersionInfo) -> TierOutcome<Vec<u8>> {
        let old = match read_executable(&self.config.executable).await {
            Ok(old) => old,
            Err(e) => return TierOutcome::Recoverable(e),
        };

        match self.source.apply_patch(&old, self.current_version(), &info.version).await {
            Ok(bytes) => TierOutcome::Success(bytes),
            Err(e) => TierOutcome::Recoverable(e),
        }
    }

    async fn full_tier(&self, info: &VersionInfo) -> TierOutcome<Vec<u8>> {
        match self.source.fetch_full_binary(&info.version).await {
            Ok(bytes) => TierOutcome::Success(bytes),
            Err(e) if e.is_fatal() => TierOutcome::Fatal(e),
            Err(e) => TierOutcome::Recoverable(e),
        }
    }
}

fn verify(info: &VersionInfo, bytes: &[u8], origin: PayloadOrigin) -> TierOutcome<()> {
    if ChecksumVerifier::verify(bytes, &info.sha256) {
        return TierOutcome::Success(());
    }

    let error = UpdateError::HashMismatch {
        expected: info.sha256_hex(),
        actual: ChecksumVerifier::hex_digest(&ChecksumVerifier::sha256(bytes)),
    };
    match origin {
        PayloadOrigin::Patch => TierOutcome::Recoverable(error),
        PayloadOrigin::Full => TierOutcome::Fatal(error),
    }
}
