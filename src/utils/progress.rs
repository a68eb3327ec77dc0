//! Progress indicators for interactive commands.
//!
//! Update checks and downloads have no meaningful length, so the only
//! indicator is a spinner. It is hidden when:
//! - `AUTOPATCH_NO_PROGRESS` is set to any value
//! - `--no-progress` is passed on the command line
//!
//! # Examples
//!
//! ```rust
//! use autopatch_cli::utils::progress::spinner_with_message;
//!
//! let spinner = spinner_with_message("Checking for updates...", true);
//! // fetch metadata
//! spinner.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Environment variable disabling every progress indicator.
pub const NO_PROGRESS_ENV: &str = "AUTOPATCH_NO_PROGRESS";

fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

/// A spinner with consistent styling.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a spinner ticking every 100ms, or a hidden one when progress is
    /// disabled through the environment.
    pub fn new_spinner() -> Self {
        if is_progress_disabled() {
            return Self::hidden();
        }

        let bar = IndicatifBar::new_spinner();
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            inner: bar,
        }
    }

    /// Creates a spinner that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Whether this spinner draws nothing.
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }

    /// Sets the message displayed next to the spinner.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Stops the spinner and leaves `msg` on screen.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Stops the spinner and removes it from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

/// Creates a spinner showing `msg`, hidden when `enabled` is false.
pub fn spinner_with_message(msg: impl Into<String>, enabled: bool) -> ProgressBar {
    let spinner = if enabled {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    spinner.set_message(msg);
    spinner
}
