//! # Storage
//!
//! Loader configuration on disk: the registry entries and plugin locations
//! a process starts from, readable as JSON, YAML or TOML.
pub mod config;
pub mod error;

pub use config::{ConfigFormat, LoaderConfig};
pub use error::StorageSystemError;
