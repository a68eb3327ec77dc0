//! Core types shared across autopatch.
//!
//! Currently this is the error taxonomy of the self-update subsystem and the
//! user-facing error rendering used by the binary.

pub mod error;

pub use error::{ErrorContext, UpdateError, user_friendly_error};
