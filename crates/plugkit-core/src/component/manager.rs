//! # Component Manager
//!
//! Discovers component libraries in plugin directories, creates one
//! component from each, and keeps them for lookup by interface.
//!
//! The manager holds a handle to the library of every component it keeps,
//! so those libraries stay mapped even if the pool is emptied while the
//! components are alive. A library whose component is still referenced
//! elsewhere when the manager lets go stays mapped until the process exits.
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::component::error::ComponentError;
use crate::component::interface::{self, Interface, InterfaceId, Plugin, Unknown};
use crate::component::library::Library;
use crate::component::object::ComponentLoader;
use crate::kernel::constants::LIBRARY_EXTENSION;
use crate::pointer::{QueryPtr, RefPtr};
use crate::utils::{self, find_files_with_extension};

/// Libraries whose components outlived the manager that loaded them.
static RETAINED: Mutex<Vec<Arc<Library>>> = Mutex::new(Vec::new());

pub struct ComponentManager {
    loader: ComponentLoader,
    unknowns: Vec<RefPtr<dyn Unknown>>,
    /// Library of each entry in `unknowns`, if it was loaded by this manager.
    origins: Vec<Option<Arc<Library>>>,
    extensions: BTreeSet<String>,
    directories: BTreeSet<PathBuf>,
}

impl ComponentManager {
    /// An empty manager. The platform library extension is registered by
    /// default.
    pub fn new(loader: ComponentLoader) -> Self {
        let mut extensions = BTreeSet::new();
        extensions.insert(LIBRARY_EXTENSION.to_string());
        Self {
            loader,
            unknowns: Vec::new(),
            origins: Vec::new(),
            extensions,
            directories: BTreeSet::new(),
        }
    }

    pub fn loader(&self) -> &ComponentLoader {
        &self.loader
    }

    pub fn add_directory(&mut self, directory: impl Into<PathBuf>) {
        self.directories.insert(directory.into());
    }

    pub fn remove_directory(&mut self, directory: &Path) -> bool {
        self.directories.remove(directory)
    }

    pub fn clear_directories(&mut self) {
        self.directories.clear();
    }

    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.directories.iter().map(PathBuf::as_path)
    }

    pub fn add_plugin_extension(&mut self, extension: &str) {
        self.extensions.insert(utils::normalize_extension(extension));
    }

    pub fn remove_plugin_extension(&mut self, extension: &str) -> bool {
        self.extensions.remove(&utils::normalize_extension(extension))
    }

    pub fn clear_plugin_extensions(&mut self) {
        self.extensions.clear();
    }

    pub fn plugin_extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Every file under the plugin directories with a plugin extension,
    /// sorted and without duplicates. Unreadable directories are logged
    /// and skipped.
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();
        for directory in &self.directories {
            for extension in &self.extensions {
                match find_files_with_extension(directory, extension) {
                    Ok(files) => found.extend(files),
                    Err(err) => {
                        warn!("Cannot search plugin directory '{}': {}", directory.display(), err)
                    }
                }
            }
        }
        debug!("Discovered {} candidate plugin file(s)", found.len());
        found.into_iter().collect()
    }

    /// Discover plugin files and load a component answering `iid` from
    /// each. See [`load_files`](Self::load_files).
    pub fn load_all(
        &mut self,
        iid: InterfaceId,
        keep_going: bool,
    ) -> Result<usize, ComponentError> {
        let files = self.discover();
        self.load_files(iid, &files, keep_going)
    }

    /// Load a component answering `iid` from each file.
    ///
    /// With `keep_going` a failing file is logged and skipped; otherwise
    /// the first failure is returned. Returns the number of components
    /// added.
    pub fn load_files<P: AsRef<Path>>(
        &mut self,
        iid: InterfaceId,
        files: &[P],
        keep_going: bool,
    ) -> Result<usize, ComponentError> {
        let mut added = 0;
        for file in files {
            let file = file.as_ref();
            match self.load_file(iid, file) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(err) if keep_going => {
                    error!("Failed to load plugin file '{}': {}", file.display(), err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(added)
    }

    /// Load a component answering `iid` from `file`. Returns whether a new
    /// component was added.
    pub fn load_file(&mut self, iid: InterfaceId, file: &Path) -> Result<bool, ComponentError> {
        let created = self.loader.create_from_path(iid, file)?;
        let added = self.add_plugin(created.instance);
        if added {
            info!("Loaded plugin file '{}'", created.library.filename().display());
            if let Some(origin) = self.origins.last_mut() {
                *origin = Some(created.library);
            }
        }
        Ok(added)
    }

    /// Keep `unknown`. Null pointers and components already held are
    /// ignored. Returns whether it was added.
    pub fn add_plugin(&mut self, unknown: RefPtr<dyn Unknown>) -> bool {
        if unknown.is_null() || self.unknowns.contains(&unknown) {
            return false;
        }
        self.unknowns.push(unknown);
        self.origins.push(None);
        true
    }

    /// The first component answering `iid`.
    pub fn get_interface(&self, iid: InterfaceId) -> Option<RefPtr<dyn Unknown>> {
        self.unknowns
            .iter()
            .find(|unknown| Self::answers(unknown, iid))
            .cloned()
    }

    /// Every component answering `iid`.
    pub fn get_interfaces(&self, iid: InterfaceId) -> Vec<RefPtr<dyn Unknown>> {
        self.unknowns
            .iter()
            .filter(|unknown| Self::answers(unknown, iid))
            .cloned()
            .collect()
    }

    /// Every component answering all of `iids`.
    pub fn get_interfaces_all(&self, iids: &[InterfaceId]) -> Vec<RefPtr<dyn Unknown>> {
        self.unknowns
            .iter()
            .filter(|unknown| iids.iter().all(|&iid| Self::answers(unknown, iid)))
            .cloned()
            .collect()
    }

    /// The first component implementing `I`, already queried.
    pub fn find<I: ?Sized + Interface>(&self) -> Option<QueryPtr<I>> {
        self.unknowns
            .iter()
            .map(QueryPtr::<I>::from_pointer)
            .find(|query| query.is_valid())
    }

    /// Every component implementing `I`, already queried.
    pub fn find_all<I: ?Sized + Interface>(&self) -> Vec<QueryPtr<I>> {
        self.unknowns
            .iter()
            .map(QueryPtr::<I>::from_pointer)
            .filter(|query| query.is_valid())
            .collect()
    }

    /// Names of the components implementing [`Plugin`].
    pub fn names(&self, sort: bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .find_all::<dyn Plugin>()
            .iter()
            .filter_map(|plugin| plugin.get().map(|plugin| plugin.plugin_name()))
            .collect();
        if sort {
            names.sort();
        }
        names
    }

    /// One-line description, e.g. `2 plugins: alpha; beta; `.
    pub fn summary(&self) -> String {
        let names = self.names(true);
        let mut summary = format!(
            "{} plugin{}: ",
            names.len(),
            if names.len() == 1 { "" } else { "s" }
        );
        for name in &names {
            summary.push_str(name);
            summary.push_str("; ");
        }
        summary
    }

    pub fn components(&self) -> &[RefPtr<dyn Unknown>] {
        &self.unknowns
    }

    pub fn len(&self) -> usize {
        self.unknowns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unknowns.is_empty()
    }

    /// Release every component, then the library handles that kept them
    /// valid. Returns the number of components released.
    ///
    /// A component still referenced outside the manager keeps its library
    /// mapped for the rest of the process.
    pub fn clear(&mut self) -> usize {
        let released = self.unknowns.len();
        let mut libraries: Vec<Arc<Library>> = Vec::new();
        let mut retained: Vec<Arc<Library>> = Vec::new();

        for (unknown, origin) in self.unknowns.drain(..).zip(self.origins.drain(..)) {
            let name = QueryPtr::<dyn Plugin>::from_pointer(&unknown)
                .get()
                .map(|plugin| plugin.plugin_name())
                .unwrap_or_else(|| "<unnamed>".to_string());
            let shared = unknown.get().is_some_and(|target| target.references() > 1);
            info!("Releasing component: {}", name);
            drop(unknown);

            let Some(library) = origin else { continue };
            if shared {
                warn!(
                    "Component '{}' is still referenced; keeping '{}' loaded",
                    name,
                    library.filename().display()
                );
                if !retained.iter().any(|held| Arc::ptr_eq(held, &library)) {
                    retained.push(library);
                }
            } else if !libraries.iter().any(|held| Arc::ptr_eq(held, &library)) {
                libraries.push(library);
            }
        }

        libraries.retain(|library| !retained.iter().any(|held| Arc::ptr_eq(held, library)));
        for library in libraries {
            info!("Releasing file: {}", library.filename().display());
        }
        if !retained.is_empty() {
            let mut global = RETAINED.lock();
            for library in retained {
                if !global.iter().any(|held| Arc::ptr_eq(held, &library)) {
                    global.push(library);
                }
            }
        }
        released
    }

    fn answers(unknown: &RefPtr<dyn Unknown>, iid: InterfaceId) -> bool {
        unknown
            .get()
            .is_some_and(|target| interface::supports(target, iid))
    }
}

impl Drop for ComponentManager {
    fn drop(&mut self) {
        if !self.is_empty() {
            self.clear();
        }
    }
}

impl fmt::Display for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("components", &self.unknowns.len())
            .field("libraries", &self.origins.iter().flatten().count())
            .field("extensions", &self.extensions)
            .field("directories", &self.directories)
            .finish()
    }
}
