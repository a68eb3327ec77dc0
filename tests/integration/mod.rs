//! Integration test suite for autopatch
//!
//! End-to-end tests of the update cycle against a local HTTP server and of the
//! `autopatch` binary itself.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **update_cycle**: Full update cycles against a `wiremock` update server
//! - **cli**: Command-line behavior of the built binary

mod cli;
mod common;
mod update_cycle;
