//! Inspect and initialize the global configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::cli::common::CommandContext;
use crate::config::GlobalConfig;

/// Arguments of `autopatch config`.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Print the effective configuration (default)
    Show,

    /// Print the configuration file location
    Path,

    /// Write a configuration file holding the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Show) | None => Self::show(ctx),
            Some(ConfigSubcommands::Path) => Self::show_path(ctx),
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(ctx, force).await,
        }
    }

    fn show(ctx: &CommandContext) -> Result<()> {
        print!("{}", ctx.global.to_toml()?);
        Ok(())
    }

    fn show_path(ctx: &CommandContext) -> Result<()> {
        let path = ctx.resolved_config_path()?;
        println!("{}", path.display());
        if !path.exists() {
            println!("{}", "(file does not exist; defaults are in effect)".dimmed());
        }
        Ok(())
    }

    async fn init(ctx: &CommandContext, force: bool) -> Result<()> {
        let path = ctx.resolved_config_path()?;
        if path.exists() && !force {
            println!("Configuration already exists at: {}", path.display());
            println!("Use --force to overwrite");
            return Ok(());
        }

        GlobalConfig::default().save_to(&path).await?;
        println!("{}", format!("Wrote default configuration to {}", path.display()).green());
        Ok(())
    }
}
