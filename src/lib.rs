//! autopatch - a self-updating command-line client
//!
//! This crate holds the self-update subsystem of the `autopatch` CLI. On
//! invocation it can detect that a newer build is published, retrieve it either
//! as a binary delta (bsdiff) or as a full gzip-compressed replacement, verify
//! the bytes against a server-supplied SHA-256 digest and atomically replace
//! the executable on disk. The new version takes effect on the next launch.
//!
//! # Architecture Overview
//!
//! ```text
//! gate ─► metadata ─► patch ─► verify ─► install
//!                       │        │
//!                       └► full ─┴► verify ─► install
//! ```
//!
//! - A persisted checkpoint rate-limits unforced checks to one per interval
//! - The patch tier is preferred because patches are much smaller than binaries
//! - Every candidate binary is verified before it touches the executable
//!
//! # Core Modules
//!
//! - [`upgrade`] - Update cycle orchestration and its components
//! - [`core`] - Error taxonomy and user-facing error rendering
//! - [`config`] - Global configuration (`~/.autopatch/config.toml`)
//! - [`cli`] - Command-line interface
//! - [`utils`] - Progress spinners
//! - [`constants`] - Defaults and well-known names
//!
//! # Example
//!
//! ```rust,no_run
//! use autopatch_cli::config::GlobalConfig;
//! use autopatch_cli::upgrade::{SelfUpdater, UpdateConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let global = GlobalConfig::load().await?;
//! let config = UpdateConfig::from_settings(&global.upgrade, "2.5.0")?;
//! let updater = SelfUpdater::new(config)?;
//! let outcome = updater.check_and_apply().await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod upgrade;
pub mod utils;
