//! Intrusive reference counting.
//!
//! Every reference-counted pointee embeds one [`RefCount`] and exposes it
//! through [`Referenced`]. The counter is the only place the count is
//! touched, so pointee types never hand-write their own increment/decrement.
use std::fmt;
use std::sync::atomic::{self, AtomicU32, Ordering};

/// Atomic reference counter embedded in a pointee.
///
/// A fresh counter starts at zero; the first smart pointer that adopts the
/// pointee brings it to one.
pub struct RefCount {
    count: AtomicU32,
}

impl RefCount {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Current number of references.
    pub fn get(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Add a reference and return the new count.
    pub fn increment(&self) -> u32 {
        // New references are always made from an existing one (or from the
        // sole owner), so no synchronization with other threads is needed.
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Drop a reference and return the remaining count.
    ///
    /// A return value of zero means the caller released the last reference
    /// and is responsible for destroying the pointee.
    pub fn decrement(&self) -> u32 {
        let released = self
            .count
            .fetch_update(Ordering::Release, Ordering::Relaxed, |current| current.checked_sub(1));
        match released {
            Ok(1) => {
                atomic::fence(Ordering::Acquire);
                0
            }
            Ok(previous) => previous - 1,
            Err(_) => {
                // Unbalanced release. The counter is left at zero.
                log::error!("RefCount::decrement called on a pointee with no references");
                u32::MAX
            }
        }
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefCount").field(&self.get()).finish()
    }
}

/// A pointee whose lifetime is governed by an embedded [`RefCount`].
///
/// Pointees adopted by a reference-counting smart pointer must have been
/// allocated with `Box`; the box is freed when the count returns to zero.
pub trait Referenced {
    fn ref_count(&self) -> &RefCount;

    /// Number of live references to this object.
    fn references(&self) -> u32 {
        self.ref_count().get()
    }
}
