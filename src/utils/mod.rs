//! Utility modules for autopatch.

pub mod progress;

pub use progress::{ProgressBar, spinner_with_message};
