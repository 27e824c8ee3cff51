//! Name-to-path registry.
//!
//! Maps a component name to the library file that provides it. Keys are
//! kept sorted so iteration (and therefore bulk creation) is deterministic.
use std::collections::BTreeMap;
use std::fmt;

use parking_lot::{Mutex, MutexGuard};

use crate::component::error::ComponentError;

#[derive(Default)]
pub struct Registry {
    entries: Mutex<BTreeMap<String, String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `key` to `path`, returning the path it replaced.
    pub fn add(&self, key: impl Into<String>, path: impl Into<String>) -> Option<String> {
        self.entries.lock().insert(key.into(), path.into())
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.lock().remove(key)
    }

    pub fn find(&self, key: &str) -> Result<String, ComponentError> {
        self.entries
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| ComponentError::RegistryKeyNotFound {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn extend<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.entries
            .lock()
            .extend(entries.into_iter().map(|(key, path)| (key.into(), path.into())));
    }

    /// Copy of the current entries in key order.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.entries
            .lock()
            .iter()
            .map(|(key, path)| (key.clone(), path.clone()))
            .collect()
    }

    /// Hold the registry lock, for iterating without copying.
    pub fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            entries: self.entries.lock(),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.lock().iter()).finish()
    }
}

/// Exclusive view of a [`Registry`].
pub struct RegistryGuard<'a> {
    entries: MutexGuard<'a, BTreeMap<String, String>>,
}

impl RegistryGuard<'_> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, path)| (key.as_str(), path.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
