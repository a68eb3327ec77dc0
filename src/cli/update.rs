//! Update autopatch to the latest published version.
//!
//! `autopatch update` bypasses the check gate: it asks the server for the
//! latest version and, if it differs from the running one, runs a forced
//! update cycle right away.
//!
//! # Examples
//!
//! ```bash
//! autopatch update
//! autopatch update --no-progress
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::common::CommandContext;
use crate::upgrade::{CycleOutcome, PayloadOrigin, SelfUpdater, UpdateSource};

/// Arguments of `autopatch update`.
#[derive(Args, Debug)]
pub struct UpdateCommand {}

impl UpdateCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let updater = ctx.updater()?;
        run_update(&updater, ctx).await
    }
}

pub(crate) async fn run_update<S: UpdateSource>(
    updater: &SelfUpdater<S>,
    ctx: &CommandContext,
) -> Result<()> {
    let spinner = ctx.spinner("Checking for updates...");
    let latest = updater.fetch_latest().await;
    spinner.finish_and_clear();

    let latest = latest.context("Unable to check for updates")?;
    if latest.version == updater.current_version() {
        println!(
            "{}",
            format!("You're already running the latest version ({})", latest.version).green()
        );
        return Ok(());
    }

    let spinner = ctx.spinner(format!("Updating to {}...", latest.version));
    let outcome = updater.force_upgrade().await;
    spinner.finish_and_clear();

    match outcome? {
        CycleOutcome::Updated {
            from,
            to,
            via,
        } => {
            let how = match via {
                PayloadOrigin::Patch => "patch",
                PayloadOrigin::Full => "full download",
            };
            println!("{}", format!("Updated {from} -> {to} ({how})").green());
            println!("The new version runs the next time you start autopatch");
            Ok(())
        }
        CycleOutcome::UpToDate {
            version,
        } => {
            println!("{}", format!("You're already running the latest version ({version})").green());
            Ok(())
        }
        CycleOutcome::Skipped => {
            println!("{}", "Development builds do not update themselves".yellow());
            Ok(())
        }
        CycleOutcome::Aborted {
            error,
            ..
        } => Err(anyhow::Error::from(error).context("Update failed")),
    }
}
