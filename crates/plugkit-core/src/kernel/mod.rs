//! # Plugkit Core Kernel
//!
//! Shared plumbing for the rest of the crate:
//!
//! - **Context**: [`ComponentContext`] owns the registry and library pool
//!   shared by loaders and managers, with a lazily created global instance.
//! - **Build mode**: [`BuildMode`] identifies debug and release binaries so
//!   mismatched component libraries can be refused.
//! - **Constants**: exported symbol names, diagnostic codes and the platform
//!   library extension.
//! - **Error Handling**: the crate-level [`Error`] and `Result` alias.
pub mod build_mode;
pub mod constants;
pub mod context;
pub mod error;

pub use build_mode::BuildMode;
pub use context::ComponentContext;
pub use error::{Error, Result};
