//! Configuration management for autopatch.
//!
//! The only persisted configuration is the user-wide [`GlobalConfig`]. Runtime
//! updater configuration is derived from it in
//! [`crate::upgrade::config::UpdateConfig`].

mod global;

pub use global::{CONFIG_PATH_ENV, GlobalConfig};
