//! Parsing and validation of `ferrite.toml` configuration files.
//!
//! This crate reads the repair configuration and produces a strongly-typed
//! [`FerriteConfig`]: resizer policy knobs, tie-cell placement, and the
//! analysis corners with their wire RC.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
