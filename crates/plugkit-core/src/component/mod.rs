//! # Components
//!
//! The component object model: interfaces identified by [`InterfaceId`],
//! components implementing [`Unknown`], and the machinery that loads
//! component libraries and creates instances from them.
//!
//! ## Pieces
//!
//! - [`interface`]: interface ids, [`Unknown`], [`ClassFactory`], [`Plugin`]
//!   and the typed [`InterfaceRequest`] components answer.
//! - [`registry`]: the name-to-path [`Registry`].
//! - [`library`] and [`pool`]: loaded libraries and the [`LibraryPool`]
//!   that loads each path at most once.
//! - [`object`]: [`ComponentLoader`], which resolves, loads, validates and
//!   instantiates.
//! - [`manager`]: [`ComponentManager`], which discovers plugin libraries
//!   in directories and keeps their components.
//! - [`export_class_factory!`](crate::export_class_factory): the entry
//!   points a component library exports.
pub mod error;
pub mod export;
pub mod interface;
pub mod library;
pub mod manager;
pub mod object;
pub mod pool;
pub mod registry;

pub use error::ComponentError;
pub use interface::{ClassFactory, Interface, InterfaceId, InterfaceRequest, Plugin, Unknown};
pub use library::{Library, LibraryLoader, LoadFailure, Module, RawFunction, SystemLoader};
pub use manager::ComponentManager;
pub use object::{ComponentLoader, Created, ErrorPolicy};
pub use pool::LibraryPool;
pub use registry::Registry;

#[cfg(test)]
mod tests;
