//! # Pointer Errors
//!
//! Errors raised by smart and query pointers whose configuration rejects
//! null. Each carries the pointee type name so a log line is enough to
//! locate the failing site.
use thiserror::Error;

use crate::component::interface::InterfaceId;
use crate::kernel::constants::codes;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("Error {}: null pointer to '{target}'", codes::NULL_POINTER)]
    NullPointer { target: &'static str },

    #[error(
        "Error {}: no interface '{target}'{}",
        codes::NO_INTERFACE,
        iid.map(|iid| format!(" (iid {iid})")).unwrap_or_default()
    )]
    NoInterface {
        target: &'static str,
        iid: Option<InterfaceId>,
    },
}

impl PointerError {
    /// Stable diagnostic code of this error.
    pub fn code(&self) -> u32 {
        match self {
            PointerError::NullPointer { .. } => codes::NULL_POINTER,
            PointerError::NoInterface { .. } => codes::NO_INTERFACE,
        }
    }
}
