//! autopatch CLI entry point
//!
//! Parses the command line, runs the command and renders errors with context
//! and suggestions. Exits with status 1 on failure.

use anyhow::Result;
use autopatch_cli::cli;
use autopatch_cli::core::error::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
