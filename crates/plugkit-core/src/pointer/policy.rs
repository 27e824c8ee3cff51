//! Policy primitives for [`SmartPointer`](crate::pointer::SmartPointer).
//!
//! Two independent families:
//!
//! - [`ReferencePolicy`]: what happens when a pointer adopts or lets go of a
//!   pointee ([`RefCounting`], [`NoReference`], [`ArrayDelete`]).
//! - [`NullPolicy`]: what happens when a null pointer is accessed, assigned
//!   or constructed ([`DoNothing`], [`NullBad`]). The policy picks the
//!   return type of the guarded operation, so a pointer that rejects null
//!   hands back a `Result` and one that tolerates null hands back the plain
//!   value or an `Option`.
use std::any;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::component::interface::InterfaceId;
use crate::pointer::error::PointerError;
use crate::pointer::referenced::Referenced;

/// Adopt/release hooks for a pointee of type `T`.
pub trait ReferencePolicy<T: ?Sized> {
    /// Called when a pointer starts holding `ptr`.
    ///
    /// # Safety
    /// `ptr` must point to a live pointee.
    unsafe fn reference(ptr: NonNull<T>);

    /// Called when a pointer stops holding `ptr`. The pointee may be
    /// destroyed by this call.
    ///
    /// # Safety
    /// `ptr` must point to a live pointee previously handed to
    /// [`reference`](Self::reference) by a pointer using this policy.
    unsafe fn unreference(ptr: NonNull<T>);
}

/// Pointers under this policy may be cloned.
pub trait SharedReference {}

/// Pointers under this policy own their pointee, so adopting a fresh `Box`
/// is always sound.
pub trait OwningReference {}

/// Delegates counting to the pointee's [`RefCount`](crate::pointer::RefCount)
/// and frees the box when the last reference goes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefCounting;

impl<T: ?Sized + Referenced> ReferencePolicy<T> for RefCounting {
    unsafe fn reference(ptr: NonNull<T>) {
        unsafe { ptr.as_ref() }.ref_count().increment();
    }

    unsafe fn unreference(ptr: NonNull<T>) {
        let remaining = unsafe { ptr.as_ref() }.ref_count().decrement();
        if remaining == 0 {
            // SAFETY: counted pointees are boxed (see `Referenced`) and this
            // was the last reference.
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
    }
}

impl SharedReference for RefCounting {}
impl OwningReference for RefCounting {}

/// Relation without ownership: nothing happens on adopt or release.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReference;

impl<T: ?Sized> ReferencePolicy<T> for NoReference {
    unsafe fn reference(_ptr: NonNull<T>) {}

    unsafe fn unreference(_ptr: NonNull<T>) {}
}

impl SharedReference for NoReference {}

/// Sole ownership of a boxed slice, released as an array.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayDelete;

impl<E> ReferencePolicy<[E]> for ArrayDelete {
    unsafe fn reference(_ptr: NonNull<[E]>) {}

    unsafe fn unreference(ptr: NonNull<[E]>) {
        // SAFETY: array pointers only adopt boxed slices and are never cloned.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

impl OwningReference for ArrayDelete {}

/// Where a null check happened. Used to build the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullSite {
    pub target: &'static str,
    pub iid: Option<InterfaceId>,
}

impl NullSite {
    pub fn of<T: ?Sized>() -> Self {
        Self {
            target: any::type_name::<T>(),
            iid: None,
        }
    }

    pub fn with_iid(mut self, iid: InterfaceId) -> Self {
        self.iid = Some(iid);
        self
    }
}

/// The error a [`NullBad`] policy raises.
pub trait Failure {
    fn failure(site: NullSite) -> PointerError;
}

/// Raise [`PointerError::NullPointer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPointerFailure;

impl Failure for NullPointerFailure {
    fn failure(site: NullSite) -> PointerError {
        PointerError::NullPointer {
            target: site.target,
        }
    }
}

/// Raise [`PointerError::NoInterface`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterfaceFailure;

impl Failure for NoInterfaceFailure {
    fn failure(site: NullSite) -> PointerError {
        PointerError::NoInterface {
            target: site.target,
            iid: site.iid,
        }
    }
}

/// Behaviour of a pointer operation when null is involved.
pub trait NullPolicy {
    /// Result of dereferencing through [`access`](Self::access).
    type Access<'a, T: ?Sized + 'a>;
    /// Result of a guarded construction or assignment producing `V`.
    type Checked<V>;

    fn access<'a, T: ?Sized + 'a>(target: Option<&'a T>, site: NullSite) -> Self::Access<'a, T>;

    /// Run `proceed` unless the policy rejects a null operand.
    fn guard<V>(is_null: bool, site: NullSite, proceed: impl FnOnce() -> V) -> Self::Checked<V>;
}

/// Null is tolerated.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoNothing;

impl NullPolicy for DoNothing {
    type Access<'a, T: ?Sized + 'a> = Option<&'a T>;
    type Checked<V> = V;

    fn access<'a, T: ?Sized + 'a>(target: Option<&'a T>, _site: NullSite) -> Option<&'a T> {
        target
    }

    fn guard<V>(_is_null: bool, _site: NullSite, proceed: impl FnOnce() -> V) -> V {
        proceed()
    }
}

/// Null is an error of kind `F`.
pub struct NullBad<F>(PhantomData<F>);

impl<F: Failure> NullPolicy for NullBad<F> {
    type Access<'a, T: ?Sized + 'a> = Result<&'a T, PointerError>;
    type Checked<V> = Result<V, PointerError>;

    fn access<'a, T: ?Sized + 'a>(
        target: Option<&'a T>,
        site: NullSite,
    ) -> Result<&'a T, PointerError> {
        target.ok_or_else(|| F::failure(site))
    }

    fn guard<V>(
        is_null: bool,
        site: NullSite,
        proceed: impl FnOnce() -> V,
    ) -> Result<V, PointerError> {
        if is_null {
            Err(F::failure(site))
        } else {
            Ok(proceed())
        }
    }
}
