//! # plugkit-core
//!
//! A component object model for loading capability-typed components out of
//! shared libraries at runtime.
//!
//! - [`pointer`]: the policy-configured intrusive smart pointer family and the
//!   query pointer that converts between interfaces.
//! - [`component`]: interface ids, the `Unknown` capability, class factories,
//!   the key→path registry, the library pool and the loader that ties them
//!   together.
//! - [`kernel`]: process-wide context, constants and the crate error type.
//! - [`storage`]: loader configuration files.
//! - [`utils`]: filesystem helpers.
pub mod component;
pub mod kernel;
pub mod pointer;
pub mod storage;
pub mod utils;

// Re-export key public types/traits for easier use by the binary and plugins
pub use component::{
    ClassFactory, ComponentError, ComponentLoader, ComponentManager, Interface, InterfaceId,
    InterfaceRequest, Library, LibraryPool, Plugin, Registry, Unknown,
};
pub use kernel::{BuildMode, ComponentContext, Error, Result};
pub use pointer::{
    PointerError, QueryPointer, QueryPtr, RefCount, RefPtr, Referenced, SmartPointer,
    ValidQueryPtr, ValidRefPtr,
};
pub use storage::LoaderConfig;
