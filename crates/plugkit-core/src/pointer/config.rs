//! Named smart-pointer configurations.
//!
//! A configuration bundles one policy per axis. The destructor axis has a
//! single behaviour (dropping never fails) and is therefore not a parameter.
use crate::pointer::policy::{
    ArrayDelete, DoNothing, NoInterfaceFailure, NoReference, NullBad, NullPointerFailure,
    NullPolicy, RefCounting,
};

/// Policy bundle selecting the behaviour of a [`SmartPointer`](crate::pointer::SmartPointer).
pub trait PointerConfig: 'static {
    type Reference;
    type Access: NullPolicy;
    type Assignment: NullPolicy;
    type Construction: NullPolicy;
}

type NullThrows = NullBad<NullPointerFailure>;

/// Deletes array pointers; null is ok.
pub struct ArrayNullOk;

impl PointerConfig for ArrayNullOk {
    type Reference = ArrayDelete;
    type Access = DoNothing;
    type Assignment = DoNothing;
    type Construction = DoNothing;
}

/// Deletes array pointers; null is an error.
pub struct ArrayNullThrows;

impl PointerConfig for ArrayNullThrows {
    type Reference = ArrayDelete;
    type Access = NullThrows;
    type Assignment = NullThrows;
    type Construction = NullThrows;
}

/// Reference counting; null is ok.
pub struct RefCountingNullOk;

impl PointerConfig for RefCountingNullOk {
    type Reference = RefCounting;
    type Access = DoNothing;
    type Assignment = DoNothing;
    type Construction = DoNothing;
}

/// Reference counting; null is an error everywhere.
pub struct RefCountingNullThrows;

impl PointerConfig for RefCountingNullThrows {
    type Reference = RefCounting;
    type Access = NullThrows;
    type Assignment = NullThrows;
    type Construction = NullThrows;
}

/// Reference counting; only accessing null is an error.
pub struct RefCountingNullAccessThrows;

impl PointerConfig for RefCountingNullAccessThrows {
    type Reference = RefCounting;
    type Access = NullThrows;
    type Assignment = DoNothing;
    type Construction = DoNothing;
}

/// Reference counting; an unanswered query is an error.
pub struct RefCountingNoInterfaceThrows;

impl PointerConfig for RefCountingNoInterfaceThrows {
    type Reference = RefCounting;
    type Access = NullBad<NoInterfaceFailure>;
    type Assignment = NullBad<NoInterfaceFailure>;
    type Construction = NullBad<NoInterfaceFailure>;
}

/// No reference counting; null is ok.
pub struct NoRefCountingNullOk;

impl PointerConfig for NoRefCountingNullOk {
    type Reference = NoReference;
    type Access = DoNothing;
    type Assignment = DoNothing;
    type Construction = DoNothing;
}

/// No reference counting; null is an error everywhere.
pub struct NoRefCountingNullThrows;

impl PointerConfig for NoRefCountingNullThrows {
    type Reference = NoReference;
    type Access = NullThrows;
    type Assignment = NullThrows;
    type Construction = NullThrows;
}

/// No reference counting; only accessing null is an error.
pub struct NoRefCountingNullAccessThrows;

impl PointerConfig for NoRefCountingNullAccessThrows {
    type Reference = NoReference;
    type Access = NullThrows;
    type Assignment = DoNothing;
    type Construction = DoNothing;
}
