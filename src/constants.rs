//! Global constants used throughout the autopatch codebase.
//!
//! This module contains the gate interval, file names, default endpoints and
//! timeouts used by the self-update subsystem. Defining them centrally makes
//! magic values discoverable.

use std::time::Duration;

/// Name of the command being updated; appended to every base URL.
pub const COMMAND_NAME: &str = "autopatch";

/// Version reported by development builds. Development builds never self-update.
pub const DEV_VERSION: &str = "dev";

/// Minimum time between unforced update checks (24 hours).
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Name of the checkpoint file inside the state directory.
pub const CHECKPOINT_FILE: &str = "cktime";

/// Default state directory, relative to the directory holding the executable.
pub const DEFAULT_STATE_DIR: &str = ".autopatch_update";

/// Default base URL for version metadata (`{base}/{cmd}/{platform}.json`).
pub const DEFAULT_METADATA_URL: &str = "https://s3.amazonaws.com/cli-autoupdates/";

/// Default base URL for full binaries (`{base}/{cmd}/{version}/{platform}.gz`).
pub const DEFAULT_BINARY_URL: &str = "https://s3.amazonaws.com/cli-autoupdates/";

/// Default base URL for delta patches (`{base}/{cmd}/{from}/{to}/{platform}`).
pub const DEFAULT_PATCH_URL: &str = "https://s3.amazonaws.com/cli-autoupdates/";

/// Default timeout for a single update HTTP request, in seconds.
///
/// Covers the whole request including the body, so it must be long enough to
/// download a full binary on a slow link.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Timeout for establishing a connection to the update server (10 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Version baked into this build.
///
/// Release pipelines stamp it through the `AUTOPATCH_BUILD_VERSION` variable at
/// compile time; local builds without the variable report the crate version.
pub const BUILD_VERSION: &str = match option_env!("AUTOPATCH_BUILD_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
