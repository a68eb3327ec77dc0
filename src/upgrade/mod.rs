//! Self-update functionality for autopatch.
//!
//! This module keeps the `autopatch` binary current without a package manager.
//! It asks the update server which version is latest, rebuilds that version
//! from a small binary delta when it can, downloads the whole binary when it
//! cannot, verifies the result against a published SHA-256 digest and only
//! then replaces the executable on disk.
//!
//! # Architecture Overview
//!
//! ## Core Components
//!
//! - **[`SelfUpdater`]**: Orchestrates one update cycle as an explicit state machine
//! - **[`UpdateGate`]**: Persistent checkpoint limiting unforced checks to one per interval
//! - **[`UpdateSource`]**: Remote seam; [`HttpUpdateSource`] talks to the update server
//! - **[`ChecksumVerifier`]**: Constant-time SHA-256 verification
//! - **[`Installer`]**: Atomic replacement of the executable
//! - **[`config::UpdateConfig`]**: Immutable per-run configuration
//!
//! ## Update Cycle
//!
//! ```text
//! 1. Gate
//!    ├── Skip if the checkpoint is in the future (unless forced)
//!    └── Write checkpoint = now + interval before any request
//!
//! 2. Checking
//!    ├── GET {metadata}/{cmd}/{platform}.json
//!    └── Stop if the remote version equals the running one
//!
//! 3. Patch tier
//!    ├── GET {patch}/{cmd}/{from}/{to}/{platform}
//!    ├── Apply bsdiff to the running executable in memory
//!    └── Verify SHA-256; on any failure go to the full tier
//!
//! 4. Full tier (at most once per cycle)
//!    ├── GET {binary}/{cmd}/{to}/{platform}.gz and gunzip
//!    └── Verify SHA-256; a mismatch is reported to the caller
//!
//! 5. Install
//!    └── Write a sibling temp file and rename it over the executable
//! ```
//!
//! # Safety Mechanisms
//!
//! - Candidate binaries live in memory until verified; the executable is never
//!   partially written on the rename path
//! - Digests are compared in constant time
//! - Development builds (`"dev"`) never update themselves
//! - Failures other than a corrupt full download or an install error leave the
//!   cycle with [`CycleOutcome::Aborted`] and the executable untouched
//!
//! # Usage Patterns
//!
//! ```bash
//! autopatch update    # Force a cycle now
//! autopatch check     # Show current and latest version only
//! ```
//!
//! Any other command runs a gated cycle first when `upgrade.auto_update` is
//! enabled in the global configuration.

/// Gate checkpoint persisted in the state directory.
pub mod checkpoint;
/// Persisted upgrade settings and the per-run [`UpdateConfig`].
pub mod config;
/// Full binary download and gzip decompression.
pub mod download;
/// Shared HTTP transport.
pub mod http;
/// Executable replacement.
pub mod install;
/// Version metadata decoding and retrieval.
pub mod metadata;
/// Delta patch retrieval and application.
pub mod patch;
/// Platform tag derivation.
pub mod platform;
/// The update cycle state machine.
pub mod self_updater;
/// Remote source abstraction.
pub mod source;
/// Digest computation and verification.
pub mod verification;

pub use checkpoint::UpdateGate;
pub use config::{UpdateConfig, UpgradeSettings};
pub use install::{Installer, ReplaceStrategy};
pub use metadata::VersionInfo;
pub use self_updater::{CycleOutcome, PayloadOrigin, SelfUpdater, Stage, TierOutcome};
pub use source::{HttpUpdateSource, UpdateSource};
pub use verification::ChecksumVerifier;
