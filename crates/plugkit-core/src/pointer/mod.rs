//! # Smart Pointers
//!
//! A single pointer type, [`SmartPointer`], whose behaviour is selected by a
//! [`PointerConfig`]: how the pointee is referenced and released, and
//! whether null is tolerated on access, assignment and construction.
//! [`QueryPointer`] is the variant initialised by asking a component for an
//! interface.
//!
//! Common configurations have aliases: [`RefPtr`], [`ValidRefPtr`],
//! [`NoRefPtr`], [`ArrayPtr`], [`QueryPtr`], [`ValidQueryPtr`] and friends.
pub mod config;
pub mod error;
pub mod policy;
pub mod query;
pub mod referenced;
pub mod smart;

pub use config::{
    ArrayNullOk, ArrayNullThrows, NoRefCountingNullAccessThrows, NoRefCountingNullOk,
    NoRefCountingNullThrows, PointerConfig, RefCountingNoInterfaceThrows,
    RefCountingNullAccessThrows, RefCountingNullOk, RefCountingNullThrows,
};
pub use error::PointerError;
pub use policy::{
    ArrayDelete, DoNothing, NoInterfaceFailure, NoReference, NullBad, NullPointerFailure,
    NullPolicy, RefCounting, ReferencePolicy,
};
pub use query::{QueryPointer, QueryPtr, ValidAccessQueryPtr, ValidQueryPtr};
pub use referenced::{RefCount, Referenced};
pub use smart::{
    ArrayPtr, NoRefPtr, RefPtr, SmartPointer, ValidAccessNoRefPtr, ValidAccessRefPtr,
    ValidArrayPtr, ValidNoRefPtr, ValidRefPtr,
};

#[cfg(test)]
mod tests;
