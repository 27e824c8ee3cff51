//! Smart pointer initialised by asking a component for an interface.
use std::fmt;
use std::ptr::NonNull;

use crate::component::interface::{self, Interface, InterfaceId, Unknown};
use crate::pointer::config::{
    PointerConfig, RefCountingNoInterfaceThrows, RefCountingNullAccessThrows, RefCountingNullOk,
};
use crate::pointer::policy::{
    DoNothing, NullPolicy, NullSite, RefCounting, ReferencePolicy, SharedReference,
};
use crate::pointer::smart::SmartPointer;

/// Query result, null when the interface is missing.
pub type QueryPtr<T> = QueryPointer<T, RefCountingNullOk>;
/// Query result; a missing interface is a `NoInterface` error.
pub type ValidQueryPtr<T> = QueryPointer<T, RefCountingNoInterfaceThrows>;
/// Query result; only access to a missing interface is an error.
pub type ValidAccessQueryPtr<T> = QueryPointer<T, RefCountingNullAccessThrows>;

/// A [`SmartPointer`] to interface `T`, obtained through
/// [`Unknown::query_interface`].
pub struct QueryPointer<T, C>
where
    T: ?Sized + Interface,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    inner: SmartPointer<T, C>,
}

impl<T, C> QueryPointer<T, C>
where
    T: ?Sized + Interface,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    fn site() -> NullSite {
        NullSite::of::<T>().with_iid(T::IID)
    }

    /// Ask `source` for `T`.
    ///
    /// A null source is never queried. The pointer takes one reference to
    /// whatever the query answers.
    ///
    /// # Safety
    /// `source` must satisfy the reference policy of `C`. For counted
    /// configurations it must live in a `Box`, as anything held by a
    /// [`RefPtr`](crate::pointer::RefPtr) does.
    pub unsafe fn query<U>(source: Option<&U>) -> <C::Construction as NullPolicy>::Checked<Self>
    where
        U: ?Sized + Unknown,
    {
        let found = source.and_then(interface::query::<T, U>);
        if source.is_some() && found.is_none() && T::IID == InterfaceId::UNKNOWN {
            log::warn!(
                "Component did not answer a query for '{}'; every component must",
                T::NAME
            );
        }
        C::Construction::guard(found.is_none(), Self::site(), move || Self {
            // SAFETY: the answer points into `source`, which the caller vouched for.
            inner: unsafe { SmartPointer::adopt(found) },
        })
    }

    /// Ask the pointee of a counted pointer for `T`.
    pub fn from_pointer<U, C2>(
        source: &SmartPointer<U, C2>,
    ) -> <C::Construction as NullPolicy>::Checked<Self>
    where
        U: ?Sized + Unknown,
        C2: PointerConfig<Reference = RefCounting>,
        C2::Reference: ReferencePolicy<U>,
    {
        // SAFETY: counted pointers only hold boxed pointees.
        unsafe { Self::query(source.get()) }
    }

    /// Ask the pointee of another query pointer for `T`.
    pub fn from_query<U, C2>(
        source: &QueryPointer<U, C2>,
    ) -> <C::Construction as NullPolicy>::Checked<Self>
    where
        U: ?Sized + Interface,
        C2: PointerConfig<Reference = RefCounting>,
        C2::Reference: ReferencePolicy<U>,
    {
        Self::from_pointer(&source.inner)
    }

    /// Re-point at whatever `source` answers for `T`, subject to the
    /// assignment policy.
    pub fn requery<U, C2>(
        &mut self,
        source: &SmartPointer<U, C2>,
    ) -> <C::Assignment as NullPolicy>::Checked<()>
    where
        U: ?Sized + Unknown,
        C2: PointerConfig<Reference = RefCounting>,
        C2::Reference: ReferencePolicy<U>,
    {
        let found = source.get().and_then(interface::query::<T, U>);
        C::Assignment::guard(found.is_none(), Self::site(), move || {
            // SAFETY: the answer points into a pointee held by a counted pointer.
            self.inner = unsafe { SmartPointer::adopt(found) };
        })
    }

    pub fn access(&self) -> <C::Access as NullPolicy>::Access<'_, T> {
        C::Access::access(self.inner.get(), Self::site())
    }

    pub fn get(&self) -> Option<&T> {
        self.inner.get()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_null()
    }

    pub fn release(self) -> Option<NonNull<T>> {
        self.inner.release()
    }

    pub fn as_smart(&self) -> &SmartPointer<T, C> {
        &self.inner
    }

    pub fn into_smart(self) -> SmartPointer<T, C> {
        self.inner
    }
}

impl<T, C> QueryPointer<T, C>
where
    T: ?Sized + Interface,
    C: PointerConfig<Construction = DoNothing>,
    C::Reference: ReferencePolicy<T>,
{
    pub fn empty() -> Self {
        Self {
            inner: SmartPointer::empty(),
        }
    }
}

impl<T, C> Default for QueryPointer<T, C>
where
    T: ?Sized + Interface,
    C: PointerConfig<Construction = DoNothing>,
    C::Reference: ReferencePolicy<T>,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, C> Clone for QueryPointer<T, C>
where
    T: ?Sized + Interface,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T> + SharedReference,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, C> PartialEq for QueryPointer<T, C>
where
    T: ?Sized + Interface,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T, C> fmt::Debug for QueryPointer<T, C>
where
    T: ?Sized + Interface,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPointer")
            .field("interface", &T::NAME)
            .field("iid", &T::IID)
            .field("inner", &self.inner)
            .finish()
    }
}
