//! Report whether a newer version is published, without installing it.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::common::CommandContext;
use crate::upgrade::{SelfUpdater, UpdateSource, VersionInfo};

/// Arguments of `autopatch check`.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl CheckCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let updater = ctx.updater()?;
        self.run(&updater, ctx).await
    }

    pub(crate) async fn run<S: UpdateSource>(
        &self,
        updater: &SelfUpdater<S>,
        ctx: &CommandContext,
    ) -> Result<()> {
        let spinner = ctx.spinner("Checking for updates...");
        let latest = updater.fetch_latest().await;
        spinner.finish_and_clear();

        let latest = latest.context("Unable to check for updates")?;
        let current = updater.current_version();

        if self.json {
            let report = serde_json::json!({
                "current": current,
                "latest": latest.version,
                "sha256": latest.sha256_hex(),
                "update_available": latest.version != current,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("{}", status_line(current, &latest));
        Ok(())
    }
}

fn status_line(current: &str, latest: &VersionInfo) -> String {
    if latest.version == current {
        return format!("autopatch {current} is up to date").green().to_string();
    }

    match latest.is_newer_than(current) {
        Some(false) => format!(
            "autopatch {current} is newer than the published version {}",
            latest.version
        )
        .yellow()
        .to_string(),
        _ => format!(
            "Update available: {current} -> {}\nRun `autopatch update` to install it",
            latest.version
        )
        .cyan()
        .to_string(),
    }
}
