//! Interface identification and the base component interfaces.
//!
//! A component is any type implementing [`Unknown`]. Callers ask it for
//! other interfaces by numeric [`InterfaceId`]; the component answers by
//! filling an [`InterfaceRequest`] with a pointer to itself viewed through
//! the requested trait.
//!
//! Identification is by IID only. Type ids are not used because the host
//! and a component library are separate compilation units.
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use serde::{Deserialize, Serialize};

use crate::pointer::{RefPtr, Referenced};

/// Numeric identifier of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceId(pub u64);

impl InterfaceId {
    /// Identifier of [`Unknown`], which every component answers.
    pub const UNKNOWN: InterfaceId = InterfaceId(1_103_312_405);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for InterfaceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base interface of every component.
///
/// Implementations answer requests for each interface they support,
/// including `dyn Unknown` itself:
///
/// ```ignore
/// fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool {
///     request.provide::<dyn Unknown>(self) || request.provide::<dyn Greeter>(self)
/// }
/// ```
///
/// Answering does not add a reference. The pointer that adopts the answer
/// does.
///
/// # Safety
/// Every target passed to [`InterfaceRequest::provide`] must be `self`.
/// Query pointers adopt the answer under the component's own reference
/// count and free it through the allocation the component lives in, so
/// answering with a field, another component or a `static` is undefined
/// behaviour.
///
/// A safe `impl` is rejected:
///
/// ```compile_fail
/// use plugkit_core::{InterfaceRequest, RefCount, Referenced, Unknown};
///
/// struct Plain {
///     count: RefCount,
/// }
///
/// impl Referenced for Plain {
///     fn ref_count(&self) -> &RefCount {
///         &self.count
///     }
/// }
///
/// impl Unknown for Plain {
///     fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool {
///         request.provide::<dyn Unknown>(self)
///     }
/// }
/// ```
pub unsafe trait Unknown: Referenced + Send + Sync {
    /// Fill `request` if this component supports the requested interface.
    /// Returns whether it did.
    fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool;
}

/// A trait-object type that can be requested through [`Unknown::query_interface`].
///
/// # Safety
/// `IID` must be unique among all `Interface` types in the process. The
/// request machinery relies on it to convert between slot types.
pub unsafe trait Interface: Unknown + 'static {
    const IID: InterfaceId;
    const NAME: &'static str;
}

/// An in-flight interface query.
///
/// Created by the caller with a typed slot (or as a bare probe), then passed
/// to the component, which calls [`provide`](Self::provide) for each
/// interface it implements until one matches.
pub struct InterfaceRequest<'a> {
    iid: InterfaceId,
    slot: Option<NonNull<()>>,
    answered: bool,
    _slot: PhantomData<&'a mut ()>,
}

impl<'a> InterfaceRequest<'a> {
    /// A request for `I` that stores the answer in `slot`.
    pub fn new<I: ?Sized + Interface>(slot: &'a mut Option<NonNull<I>>) -> Self {
        Self {
            iid: I::IID,
            slot: Some(NonNull::from(slot).cast()),
            answered: false,
            _slot: PhantomData,
        }
    }

    /// A request that only records whether `iid` is supported.
    pub fn probe(iid: InterfaceId) -> InterfaceRequest<'static> {
        InterfaceRequest {
            iid,
            slot: None,
            answered: false,
            _slot: PhantomData,
        }
    }

    pub fn iid(&self) -> InterfaceId {
        self.iid
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    /// Answer the request with `target` viewed as `I`, if `I` is what was
    /// asked for.
    pub fn provide<I: ?Sized + Interface>(&mut self, target: &I) -> bool {
        if I::IID != self.iid {
            return false;
        }
        if let Some(slot) = self.slot {
            // SAFETY: the slot was created by `new::<J>` with `J::IID == self.iid`.
            // IIDs are unique per interface type, so `J` is `I`.
            unsafe {
                slot.cast::<Option<NonNull<I>>>()
                    .as_ptr()
                    .write(Some(NonNull::from(target)));
            }
        }
        self.answered = true;
        true
    }
}

impl fmt::Debug for InterfaceRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceRequest")
            .field("iid", &self.iid)
            .field("answered", &self.answered)
            .finish()
    }
}

/// Ask `source` for interface `I`. No reference is added.
pub fn query<I, U>(source: &U) -> Option<NonNull<I>>
where
    I: ?Sized + Interface,
    U: ?Sized + Unknown,
{
    let mut slot = None;
    let mut request = InterfaceRequest::new::<I>(&mut slot);
    source.query_interface(&mut request);
    if request.is_answered() { slot } else { None }
}

/// Whether `source` answers requests for `iid`.
pub fn supports<U: ?Sized + Unknown>(source: &U, iid: InterfaceId) -> bool {
    let mut request = InterfaceRequest::probe(iid);
    source.query_interface(&mut request);
    request.is_answered()
}

unsafe impl Interface for dyn Unknown {
    const IID: InterfaceId = InterfaceId::UNKNOWN;
    const NAME: &'static str = "Unknown";
}

/// Creates component instances. Every component library exports one.
pub trait ClassFactory: Unknown {
    /// A new instance answering `iid`, or null if this factory has no such
    /// component.
    fn create_instance(&self, iid: InterfaceId) -> RefPtr<dyn Unknown>;
}

unsafe impl Interface for dyn ClassFactory {
    const IID: InterfaceId = InterfaceId(1_245_183_409);
    const NAME: &'static str = "ClassFactory";
}

/// A component that can be managed as a plugin.
pub trait Plugin: Unknown {
    fn plugin_name(&self) -> String;
}

unsafe impl Interface for dyn Plugin {
    const IID: InterfaceId = InterfaceId(1_792_360_446);
    const NAME: &'static str = "Plugin";
}
