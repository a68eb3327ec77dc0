//! Error handling for autopatch
//!
//! This module provides the typed error taxonomy of the self-update subsystem and
//! user-friendly error reporting for the CLI. The error system follows two principles:
//! 1. **Strongly-typed errors** so the update orchestrator can decide, per failure,
//!    whether to fall back to the next retrieval tier or abort
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`UpdateError`] - Enumerated failure cases of an update cycle
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! # Error Categories
//!
//! - **Transport**: [`UpdateError::Network`], [`UpdateError::HttpStatus`]
//! - **Metadata**: [`UpdateError::MalformedMetadata`]
//! - **Delta patches**: [`UpdateError::PatchFetch`], [`UpdateError::PatchApply`]
//! - **Full binaries**: [`UpdateError::Decompression`]
//! - **Integrity**: [`UpdateError::HashMismatch`]
//! - **Installation**: [`UpdateError::Install`]
//!
//! Only [`UpdateError::HashMismatch`] on the full-binary path and
//! [`UpdateError::Install`] are surfaced to callers as fatal; the rest are
//! absorbed by the orchestrator as fallbacks or silent aborts.
//!
//! # Examples
//!
//! ```rust,no_run
//! use autopatch_cli::core::{UpdateError, user_friendly_error};
//!
//! let err = UpdateError::HashMismatch {
//!     expected: "ab".repeat(32),
//!     actual: "cd".repeat(32),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display(); // Shows colored error with a manual-upgrade suggestion
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Failure cases of the self-update subsystem.
///
/// Variants carry plain strings rather than source errors so the type stays
/// `Clone` and can be re-wrapped into an [`ErrorContext`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// Transport-level failure (DNS, connect, TLS, timeout, body read).
    #[error("Network error while fetching {url}: {reason}")]
    Network {
        /// The URL being fetched
        url: String,
        /// Description of the transport failure
        reason: String,
    },

    /// The server answered with a status other than 200.
    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus {
        /// The URL being fetched
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// Version metadata could not be decoded or carried an invalid digest.
    #[error("Malformed update metadata from {url}: {reason}")]
    MalformedMetadata {
        /// The metadata URL
        url: String,
        /// Why the metadata was rejected
        reason: String,
    },

    /// The delta patch could not be downloaded.
    #[error("Failed to fetch patch from {url}: {reason}")]
    PatchFetch {
        /// The patch URL
        url: String,
        /// Description of the failure
        reason: String,
    },

    /// The delta patch could not be applied to the running executable.
    #[error("Failed to apply patch: {reason}")]
    PatchApply {
        /// Description of the failure
        reason: String,
    },

    /// The full binary download was not a valid gzip stream.
    #[error("Failed to decompress binary: {reason}")]
    Decompression {
        /// Description of the failure
        reason: String,
    },

    /// The candidate binary does not match the digest published in the metadata.
    #[error("Binary hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Hex-encoded expected SHA-256
        expected: String,
        /// Hex-encoded SHA-256 of the candidate bytes
        actual: String,
    },

    /// The verified binary could not be written over the executable.
    #[error("Failed to install update to {path}: {reason}")]
    Install {
        /// The executable path
        path: String,
        /// Description of the failure
        reason: String,
    },

    /// Invalid or unusable updater configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },
}

impl UpdateError {
    /// Whether this error must reach the caller instead of being absorbed by
    /// the orchestrator.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::HashMismatch { .. } | Self::Install { .. })
    }
}

/// Error wrapper carrying user-facing details and a suggestion.
///
/// Details are printed in yellow and suggestions in green by [`display`](Self::display).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error message
    pub error: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

const MANUAL_UPGRADE: &str =
    "Please upgrade your CLI manually; the currently installed binary was left untouched";

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Known [`UpdateError`] variants get tailored suggestions; anything else is
/// rendered with its full `anyhow` cause chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(ctx) = error.downcast_ref::<ErrorContext>() {
        return ErrorContext {
            error: ctx.error.clone(),
            suggestion: ctx.suggestion.clone(),
            details: ctx.details.clone(),
        };
    }

    if let Some(update_error) = error.downcast_ref::<UpdateError>() {
        let mut ctx = create_error_context(update_error);
        let outer = error.to_string();
        if outer != ctx.error {
            ctx.error = format!("{outer}: {}", ctx.error);
        }
        return ctx;
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(message)
}

fn create_error_context(error: &UpdateError) -> ErrorContext {
    let ctx = ErrorContext::new(error.to_string());
    match error {
        UpdateError::HashMismatch { .. } => ctx
            .with_suggestion(MANUAL_UPGRADE)
            .with_details(
                "The downloaded binary did not match the published SHA-256 digest and was discarded",
            ),
        UpdateError::Install { .. } => ctx
            .with_suggestion(MANUAL_UPGRADE)
            .with_details(
                "The executable could not be replaced. Check that you have write permission to its directory",
            ),
        UpdateError::Network { .. } | UpdateError::HttpStatus { .. } => ctx
            .with_suggestion("Check your internet connection and try again later")
            .with_details("The update server could not be reached"),
        UpdateError::MalformedMetadata { .. } => ctx
            .with_suggestion("Try again later; if the problem persists, upgrade manually")
            .with_details("The update server returned version information that could not be used"),
        UpdateError::PatchFetch { .. }
        | UpdateError::PatchApply { .. }
        | UpdateError::Decompression { .. } => ctx.with_suggestion(MANUAL_UPGRADE),
        UpdateError::Config { .. } => ctx.with_suggestion(
            "Check ~/.autopatch/config.toml or the file named by AUTOPATCH_CONFIG_PATH",
        ),
    }
}
