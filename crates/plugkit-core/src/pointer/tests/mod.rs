
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::component::interface::{Interface, InterfaceId, InterfaceRequest, Unknown};
use crate::pointer::{RefCount, Referenced};

/// Test component recording when it is destroyed and how often it is queried.
pub(super) struct Tracked {
    count: RefCount,
    name: String,
    dropped: Arc<AtomicBool>,
    queries: Arc<AtomicUsize>,
}

impl Tracked {
    pub(super) fn new(name: &str) -> (Box<Self>, Arc<AtomicBool>) {
        let dropped = Arc::new(AtomicBool::new(false));
        let tracked = Box::new(Self {
            count: RefCount::new(),
            name: name.to_string(),
            dropped: dropped.clone(),
            queries: Arc::new(AtomicUsize::new(0)),
        });
        (tracked, dropped)
    }

    pub(super) fn queries(&self) -> Arc<AtomicUsize> {
        self.queries.clone()
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

impl Referenced for Tracked {
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

// SAFETY: every answer is `self`.
unsafe impl Unknown for Tracked {
    fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        request.provide::<dyn Unknown>(self) || request.provide::<dyn Named>(self)
    }
}

pub(super) trait Named: Unknown {
    fn name(&self) -> &str;
}

unsafe impl Interface for dyn Named {
    const IID: InterfaceId = InterfaceId(9_001);
    const NAME: &'static str = "Named";
}

impl Named for Tracked {
    fn name(&self) -> &str {
        &self.name
    }
}

/// An interface nothing implements.
pub(super) trait Absent: Unknown {}

unsafe impl Interface for dyn Absent {
    const IID: InterfaceId = InterfaceId(9_002);
    const NAME: &'static str = "Absent";
}
