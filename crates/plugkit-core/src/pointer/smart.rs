//! The policy-parameterized smart pointer.
use std::any;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::pointer::config::{
    ArrayNullOk, ArrayNullThrows, NoRefCountingNullAccessThrows, NoRefCountingNullOk,
    NoRefCountingNullThrows, PointerConfig, RefCountingNullAccessThrows, RefCountingNullOk,
    RefCountingNullThrows,
};
use crate::pointer::policy::{
    DoNothing, NullPolicy, NullSite, OwningReference, ReferencePolicy, SharedReference,
};

/// Reference counting, null tolerated.
pub type RefPtr<T> = SmartPointer<T, RefCountingNullOk>;
/// Reference counting, null rejected on construction, assignment and access.
pub type ValidRefPtr<T> = SmartPointer<T, RefCountingNullThrows>;
/// Reference counting, null rejected on access only.
pub type ValidAccessRefPtr<T> = SmartPointer<T, RefCountingNullAccessThrows>;
/// Non-owning, null tolerated.
pub type NoRefPtr<T> = SmartPointer<T, NoRefCountingNullOk>;
/// Non-owning, null rejected everywhere.
pub type ValidNoRefPtr<T> = SmartPointer<T, NoRefCountingNullThrows>;
/// Non-owning, null rejected on access only.
pub type ValidAccessNoRefPtr<T> = SmartPointer<T, NoRefCountingNullAccessThrows>;
/// Sole owner of a boxed slice, null tolerated.
pub type ArrayPtr<E> = SmartPointer<[E], ArrayNullOk>;
/// Sole owner of a boxed slice, null rejected everywhere.
pub type ValidArrayPtr<E> = SmartPointer<[E], ArrayNullThrows>;

/// Nullable handle to a `T` whose behaviour is chosen by the configuration `C`.
///
/// The reference policy decides what adopting and letting go of the pointee
/// does. The access, assignment and construction policies decide whether
/// null is tolerated; when it is not, the affected operations return
/// `Result<_, PointerError>`.
pub struct SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    ptr: Option<NonNull<T>>,
    _marker: PhantomData<(Box<T>, C)>,
}

impl<T, C> SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    /// Take a reference to `ptr` without consulting the construction policy.
    ///
    /// # Safety
    /// `ptr` must be `None` or point to a live pointee that satisfies the
    /// reference policy's allocation requirements.
    pub(crate) unsafe fn adopt(ptr: Option<NonNull<T>>) -> Self {
        if let Some(ptr) = ptr {
            unsafe { C::Reference::reference(ptr) };
        }
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Adopt a freshly boxed pointee.
    pub fn from_box(value: Box<T>) -> Self
    where
        C::Reference: OwningReference,
    {
        let ptr = NonNull::from(Box::leak(value));
        // SAFETY: a leaked box is live and was allocated by `Box`.
        unsafe { Self::adopt(Some(ptr)) }
    }

    /// Adopt a raw pointer, subject to the construction policy.
    ///
    /// # Safety
    /// `ptr` must be null or point to a live pointee that satisfies the
    /// reference policy. Counted and array pointees must come from `Box`.
    pub unsafe fn from_raw(ptr: *mut T) -> <C::Construction as NullPolicy>::Checked<Self> {
        let ptr = NonNull::new(ptr);
        C::Construction::guard(ptr.is_none(), NullSite::of::<T>(), move || unsafe {
            Self::adopt(ptr)
        })
    }

    /// The pointee, or the access policy's verdict on null.
    pub fn access(&self) -> <C::Access as NullPolicy>::Access<'_, T> {
        C::Access::access(self.get(), NullSite::of::<T>())
    }

    /// The pointee, ignoring the access policy.
    pub fn get(&self) -> Option<&T> {
        // SAFETY: a held pointer stays live for as long as this handle does.
        self.ptr.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    pub fn is_valid(&self) -> bool {
        self.ptr.is_some()
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    pub fn as_non_null(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Give up the pointer without releasing its reference.
    ///
    /// The caller becomes responsible for the reference this handle held.
    pub fn release(mut self) -> Option<NonNull<T>> {
        self.ptr.take()
    }

    /// Replace the pointee with the one held by `other`.
    ///
    /// The new pointee is referenced before the old one is released, so
    /// assigning a pointer to itself is harmless.
    pub fn assign_from(&mut self, other: Self) -> <C::Assignment as NullPolicy>::Checked<()> {
        C::Assignment::guard(other.is_null(), NullSite::of::<T>(), move || {
            *self = other;
        })
    }

    /// Share the pointee held by `other`.
    pub fn assign(&mut self, other: &Self) -> <C::Assignment as NullPolicy>::Checked<()>
    where
        C::Reference: SharedReference,
    {
        // SAFETY: `other` holds a live pointee adopted under the same policy.
        let shared = unsafe { Self::adopt(other.ptr) };
        self.assign_from(shared)
    }

    /// Release the pointee and become null, if the assignment policy allows it.
    pub fn reset(&mut self) -> <C::Assignment as NullPolicy>::Checked<()> {
        C::Assignment::guard(true, NullSite::of::<T>(), move || {
            if let Some(ptr) = self.ptr.take() {
                unsafe { C::Reference::unreference(ptr) };
            }
        })
    }

    /// Move the held reference into a pointer with other null policies.
    ///
    /// Only the null policies may differ; the reference carries over as is.
    pub fn into_config<C2>(self) -> <C2::Construction as NullPolicy>::Checked<SmartPointer<T, C2>>
    where
        C2: PointerConfig<Reference = C::Reference>,
        C2::Reference: ReferencePolicy<T>,
    {
        let ptr = self.release();
        C2::Construction::guard(ptr.is_none(), NullSite::of::<T>(), move || SmartPointer {
            ptr,
            _marker: PhantomData,
        })
    }

    fn address(&self) -> Option<NonNull<()>> {
        self.ptr.map(NonNull::cast)
    }
}

impl<T, C> SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig<Construction = DoNothing>,
    C::Reference: ReferencePolicy<T>,
{
    /// A null pointer. Only available when construction tolerates null.
    pub fn empty() -> Self {
        Self {
            ptr: None,
            _marker: PhantomData,
        }
    }
}

impl<T, C> Default for SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig<Construction = DoNothing>,
    C::Reference: ReferencePolicy<T>,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, C> Clone for SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T> + SharedReference,
{
    fn clone(&self) -> Self {
        // SAFETY: the pointee is live while `self` holds it.
        unsafe { Self::adopt(self.ptr) }
    }
}

impl<T, C> Drop for SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `ptr` was adopted under this policy and is released once.
            unsafe { C::Reference::unreference(ptr) };
        }
    }
}

/// Pointers compare by address.
impl<T, C> PartialEq for SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl<T, C> Eq for SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
}

impl<T, C> fmt::Debug for SmartPointer<T, C>
where
    T: ?Sized,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartPointer")
            .field("target", &any::type_name::<T>())
            .field("address", &self.address())
            .finish()
    }
}

// SAFETY: the pointer hands out shared references only, and reference
// counts are atomic, so the usual `Arc` rules apply.
unsafe impl<T, C> Send for SmartPointer<T, C>
where
    T: ?Sized + Send + Sync,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
}

unsafe impl<T, C> Sync for SmartPointer<T, C>
where
    T: ?Sized + Send + Sync,
    C: PointerConfig,
    C::Reference: ReferencePolicy<T>,
{
}
