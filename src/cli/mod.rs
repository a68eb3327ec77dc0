//! Command-line interface for autopatch.
//!
//! The binary exposes the self-update subsystem to users. Each command lives
//! in its own module with its own argument structure and execution logic.
//!
//! # Available Commands
//!
//! - `update` - Check for a newer version now and install it
//! - `check` - Show the current and latest published version
//! - `version` - Print the running version
//! - `config` - Show, create or locate the global configuration
//!
//! # Opportunistic Updates
//!
//! Commands other than `update` and `check` first run a gated update cycle
//! when `upgrade.auto_update` is enabled. The gate allows at most one check per
//! `upgrade.check_interval`, so most invocations make no network request. Pass
//! `--no-update-check` to skip it for one invocation.
//!
//! # Global Options
//!
//! ```bash
//! autopatch --verbose check           # debug logging
//! autopatch --quiet version           # errors only
//! autopatch --config ./cfg.toml check # alternate configuration file
//! autopatch --no-progress update      # no spinner
//! ```
//!
//! `RUST_LOG` overrides the level chosen by `--verbose`/`--quiet`.

mod check;
mod common;
mod config;
mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::GlobalConfig;
use crate::constants::BUILD_VERSION;
use crate::upgrade::{CycleOutcome, platform};

pub use common::CommandContext;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    /// Hide spinners.
    pub no_progress: bool,
    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
    /// Skip the opportunistic update check.
    pub no_update_check: bool,
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level.as_deref().unwrap_or("warn"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Top-level command-line parser.
#[derive(Parser)]
#[command(
    name = "autopatch",
    about = "Self-updating command-line client",
    version = BUILD_VERSION,
    long_about = "autopatch keeps itself current by applying binary patches, or downloading full releases, verified against published SHA-256 digests."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the global configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable progress spinners
    #[arg(long, global = true)]
    no_progress: bool,

    /// Skip the automatic update check for this invocation
    #[arg(long, global = true)]
    no_update_check: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check for a newer version and install it now
    Update(update::UpdateCommand),

    /// Show the current and latest published version
    Check(check::CheckCommand),

    /// Print the running version
    Version,

    /// Manage the global configuration
    Config(config::ConfigCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
            no_update_check: self.no_update_check,
        }
    }

    /// Execute with an explicit configuration, without touching logging.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let global = GlobalConfig::load_with_optional(config.config_path.clone()).await?;
        let ctx = CommandContext::new(global, config.config_path.clone(), !config.no_progress);

        match self.command {
            Commands::Update(cmd) => cmd.execute(&ctx).await,
            Commands::Check(cmd) => cmd.execute(&ctx).await,
            Commands::Version => {
                opportunistic_update(&ctx, config.no_update_check).await?;
                println!("{} {} ({})", "autopatch".bold(), BUILD_VERSION, platform::platform_tag());
                Ok(())
            }
            Commands::Config(cmd) => {
                opportunistic_update(&ctx, config.no_update_check).await?;
                cmd.execute(&ctx).await
            }
        }
    }
}

/// Run a gated update cycle before an ordinary command.
///
/// Quiet unless something was installed. Only a corrupt full download or a
/// failed install is returned as an error.
async fn opportunistic_update(ctx: &CommandContext, skip: bool) -> Result<()> {
    if skip || !ctx.global.upgrade.auto_update {
        debug!("Automatic update check disabled");
        return Ok(());
    }

    let updater = match ctx.updater() {
        Ok(updater) => updater,
        Err(e) => {
            warn!("Automatic update check unavailable: {:#}", e);
            return Ok(());
        }
    };

    match updater.check_and_apply().await? {
        CycleOutcome::Updated {
            from,
            to,
            ..
        } => {
            eprintln!(
                "{}",
                format!("autopatch updated {from} -> {to}; the new version runs next time").green()
            );
        }
        CycleOutcome::Aborted {
            stage,
            error,
        } => debug!("Automatic update stopped at {:?}: {}", stage, error),
        outcome => debug!("Automatic update check: {:?}", outcome),
    }

    Ok(())
}
