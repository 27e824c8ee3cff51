//! # Plugkit Core Errors
//!
//! Defines [`Error`], the crate-level error that wraps the typed errors of
//! each subsystem: smart pointers, component loading and configuration
//! storage. Every variant maps to a stable diagnostic code through
//! [`Error::code`].
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::component::error::ComponentError;
use crate::kernel::constants::codes;
use crate::pointer::error::PointerError;
use crate::storage::error::StorageSystemError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// A smart or query pointer rejected null
    #[error("Pointer error: {0}")]
    Pointer(#[from] PointerError),

    /// Component lookup, loading or creation failed
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// Reading or writing loader configuration failed
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// Stable diagnostic code of the underlying error.
    pub fn code(&self) -> u32 {
        match self {
            Error::Pointer(err) => err.code(),
            Error::Component(err) => err.code(),
            Error::StorageSystem(_) => codes::STORAGE,
            Error::Other(_) => codes::OTHER,
        }
    }

    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::StorageSystem(StorageSystemError::io(source, operation, path))
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
