//! Process-wide cache of loaded libraries.
//!
//! Each path is loaded at most once. Successes and failures are both
//! remembered, so asking again for a path that failed reports the original
//! failure without touching the loader.
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::component::error::ComponentError;
use crate::component::library::{Library, LibraryLoader, LoadFailure, SystemLoader};

enum PoolEntry {
    Loaded(Arc<Library>),
    Failed(LoadFailure),
}

pub struct LibraryPool {
    loader: Arc<dyn LibraryLoader>,
    entries: Mutex<HashMap<PathBuf, PoolEntry>>,
}

impl LibraryPool {
    pub fn new(loader: Arc<dyn LibraryLoader>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_system_loader() -> Self {
        Self::new(Arc::new(SystemLoader))
    }

    /// The key a path is cached under: its canonical form when it exists,
    /// the path as given otherwise.
    pub fn normalize(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// The library at `path`, loading it on first request.
    ///
    /// The pool lock is held across the check, the load and the insert, so
    /// concurrent callers asking for the same path share one load.
    pub fn load(&self, path: &Path) -> Result<Arc<Library>, ComponentError> {
        let key = Self::normalize(path);
        let mut entries = self.entries.lock();

        match entries.get(&key) {
            Some(PoolEntry::Loaded(library)) => {
                debug!("Library '{}' already loaded", key.display());
                return Ok(Arc::clone(library));
            }
            Some(PoolEntry::Failed(failure)) => {
                debug!("Library '{}' failed to load earlier: {}", key.display(), failure);
                return Err(ComponentError::load_failed(key, failure));
            }
            None => {}
        }

        info!("Loading library '{}'", key.display());
        match self.loader.load(&key) {
            Ok(module) => {
                let library = Arc::new(Library::new(key.clone(), module));
                entries.insert(key, PoolEntry::Loaded(Arc::clone(&library)));
                Ok(library)
            }
            Err(failure) => {
                warn!("Failed to load library '{}': {}", key.display(), failure);
                let err = ComponentError::load_failed(key.clone(), &failure);
                entries.insert(key, PoolEntry::Failed(failure));
                Err(err)
            }
        }
    }

    /// The already loaded library at `path`, if any.
    pub fn find(&self, path: &Path) -> Option<Arc<Library>> {
        match self.entries.lock().get(&Self::normalize(path)) {
            Some(PoolEntry::Loaded(library)) => Some(Arc::clone(library)),
            _ => None,
        }
    }

    /// Whether `path` has been tried, successfully or not.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.lock().contains_key(&Self::normalize(path))
    }

    pub fn has_failed(&self, path: &Path) -> bool {
        matches!(
            self.entries.lock().get(&Self::normalize(path)),
            Some(PoolEntry::Failed(_))
        )
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Paths of all loaded libraries, sorted.
    pub fn filenames(&self) -> Vec<PathBuf> {
        let mut names: Vec<PathBuf> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, entry)| matches!(entry, PoolEntry::Loaded(_)))
            .map(|(path, _)| path.clone())
            .collect();
        names.sort();
        names
    }

    /// Forget every entry and drop the pool's handles.
    ///
    /// A library stays mapped while anything else still holds its `Arc`.
    /// Returns the number of entries released.
    pub fn release_all(&self) -> usize {
        let drained: Vec<(PathBuf, PoolEntry)> = self.entries.lock().drain().collect();
        let released = drained.len();
        for (path, entry) in drained {
            if let PoolEntry::Loaded(library) = entry {
                info!("Releasing file: {}", path.display());
                drop(library);
            }
        }
        released
    }
}

impl fmt::Debug for LibraryPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryPool")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
