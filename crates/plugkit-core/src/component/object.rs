//! Component creation: name resolution, library loading, build-mode
//! validation and factory invocation.
//!
//! A request runs through five steps:
//!
//! 1. **Resolve** the name: an existing file is used as is, anything else
//!    is looked up in the [`Registry`].
//! 2. **Load** the library through the [`LibraryPool`], which caches both
//!    successes and failures.
//! 3. **Validate** that the library was built in the caller's [`BuildMode`].
//! 4. **Fetch** the library's class factory.
//! 5. **Instantiate** through [`ClassFactory::create_instance`].
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, warn};

use crate::component::error::ComponentError;
use crate::component::interface::{ClassFactory, Interface, InterfaceId, Unknown};
use crate::component::library::Library;
use crate::component::pool::LibraryPool;
use crate::component::registry::Registry;
use crate::kernel::build_mode::BuildMode;
use crate::kernel::constants::{DEBUG_PROBE_SYMBOL, FACTORY_GETTER_SYMBOL};
use crate::kernel::context::ComponentContext;
use crate::pointer::{QueryPtr, RefCountingNullOk, RefCountingNullThrows, RefPtr, ValidRefPtr};
use crate::utils;

/// Signature of the exported build-mode probe.
pub type DebugProbeFn = extern "C" fn() -> bool;

/// Signature of the exported factory getter.
pub type FactoryGetterFn = fn() -> RefPtr<dyn ClassFactory>;

/// Which failures [`ComponentLoader::create_quietly`] hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorPolicy {
    /// Propagate failures from the known error taxonomy.
    pub propagate_expected: bool,
    /// Propagate panics raised by component code.
    pub propagate_unexpected: bool,
}

impl ErrorPolicy {
    /// Swallow everything.
    pub const QUIET: ErrorPolicy = ErrorPolicy {
        propagate_expected: false,
        propagate_unexpected: false,
    };

    /// Propagate everything.
    pub const STRICT: ErrorPolicy = ErrorPolicy {
        propagate_expected: true,
        propagate_unexpected: true,
    };
}

/// A new component together with the factory and library that produced it.
///
/// Fields drop in declaration order, so the library handle goes last.
pub struct Created {
    pub instance: RefPtr<dyn Unknown>,
    pub factory: ValidRefPtr<dyn ClassFactory>,
    pub library: Arc<Library>,
}

impl fmt::Debug for Created {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Created")
            .field("library", &self.library.filename())
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ComponentLoader {
    registry: Arc<Registry>,
    pool: Arc<LibraryPool>,
    build_mode: BuildMode,
}

impl ComponentLoader {
    pub fn new(registry: Arc<Registry>, pool: Arc<LibraryPool>) -> Self {
        Self {
            registry,
            pool,
            build_mode: BuildMode::current(),
        }
    }

    /// A loader over the process-wide registry and pool.
    pub fn global() -> Self {
        ComponentContext::global().loader()
    }

    /// Override the build mode libraries are checked against.
    pub fn with_build_mode(mut self, build_mode: BuildMode) -> Self {
        self.build_mode = build_mode;
        self
    }

    pub fn build_mode(&self) -> BuildMode {
        self.build_mode
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn pool(&self) -> &Arc<LibraryPool> {
        &self.pool
    }

    /// Library path for `name`: the name itself if it is an existing file,
    /// otherwise its registry entry.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ComponentError> {
        if utils::is_file(name) {
            Ok(PathBuf::from(name))
        } else {
            self.registry.find(name).map(PathBuf::from)
        }
    }

    /// Create a component answering `iid` from the library named `name`.
    ///
    /// An empty result means the factory has no component for `iid`.
    pub fn create(
        &self,
        iid: InterfaceId,
        name: &str,
    ) -> Result<RefPtr<dyn Unknown>, ComponentError> {
        Ok(self.create_with_factory(iid, name)?.instance)
    }

    pub fn create_with_factory(
        &self,
        iid: InterfaceId,
        name: &str,
    ) -> Result<Created, ComponentError> {
        let path = self.resolve(name)?;
        self.create_from_path(iid, &path)
    }

    /// Like [`create`](Self::create), with the name taken as a literal path.
    pub fn create_from_path(
        &self,
        iid: InterfaceId,
        path: &Path,
    ) -> Result<Created, ComponentError> {
        let library = self.pool.load(path)?;
        self.create_from_library(iid, library)
    }

    pub fn create_from_library(
        &self,
        iid: InterfaceId,
        library: Arc<Library>,
    ) -> Result<Created, ComponentError> {
        let factory = self.class_factory(&library)?;
        let instance = {
            let target = factory.access()?;
            call_component(&library, "create_instance", || target.create_instance(iid))?
        };
        debug!(
            "Created component for interface {} from '{}' ({})",
            iid,
            library.filename().display(),
            if instance.is_valid() { "supported" } else { "unsupported" }
        );
        Ok(Created {
            instance,
            factory,
            library,
        })
    }

    /// Create a component and query it for `I`.
    pub fn create_as<I: ?Sized + Interface>(
        &self,
        name: &str,
    ) -> Result<QueryPtr<I>, ComponentError> {
        let unknown = self.create(I::IID, name)?;
        Ok(QueryPtr::<I>::from_pointer(&unknown))
    }

    /// The validated class factory of the library named `name`.
    pub fn factory(&self, name: &str) -> Result<ValidRefPtr<dyn ClassFactory>, ComponentError> {
        let path = self.resolve(name)?;
        let library = self.pool.load(&path)?;
        self.class_factory(&library)
    }

    /// Check the library's build mode, then fetch its class factory.
    ///
    /// The factory getter is not looked up, let alone called, when the
    /// build modes disagree.
    pub fn class_factory(
        &self,
        library: &Library,
    ) -> Result<ValidRefPtr<dyn ClassFactory>, ComponentError> {
        let probe = library.require(DEBUG_PROBE_SYMBOL)?;
        // SAFETY: the probe's signature is fixed by the component ABI.
        let probe: DebugProbeFn = unsafe { probe.cast() };
        let is_debug = call_component(library, DEBUG_PROBE_SYMBOL, || probe())?;
        let library_mode = BuildMode::from_debug_flag(is_debug);
        if library_mode != self.build_mode {
            return Err(ComponentError::MismatchedBuildModes {
                library: library.filename().to_path_buf(),
                loader_mode: self.build_mode,
                library_mode,
            });
        }

        let getter = library.require(FACTORY_GETTER_SYMBOL)?;
        // SAFETY: the getter's signature is fixed by the component ABI.
        let getter: FactoryGetterFn = unsafe { getter.cast() };
        let factory = call_component(library, FACTORY_GETTER_SYMBOL, || getter())?;
        Ok(factory.into_config::<RefCountingNullThrows>()?)
    }

    /// Try `filename` in each of `directories` in order.
    ///
    /// Candidates are literal paths. Load failures and missing exports move
    /// on to the next candidate; any other error is returned at once. When
    /// every candidate fails the result is a single
    /// [`ComponentError::ComponentCreationFailed`] listing the attempted paths.
    pub fn create_in<P: AsRef<Path>>(
        &self,
        iid: InterfaceId,
        directories: &[P],
        filename: &str,
    ) -> Result<RefPtr<dyn Unknown>, ComponentError> {
        let mut attempted = Vec::with_capacity(directories.len());
        let mut last_os_failure: Option<(Option<i32>, String)> = None;

        for directory in directories {
            let candidate = utils::join_candidate(directory, filename);
            debug!("Trying component candidate '{}'", candidate.display());
            attempted.push(candidate.clone());

            match self.create_from_path(iid, &candidate) {
                Ok(created) => {
                    let instance = created.instance.into_config::<RefCountingNullThrows>()?;
                    return Ok(instance.into_config::<RefCountingNullOk>());
                }
                Err(err) if err.is_expected() => {
                    debug!("Candidate '{}' rejected: {}", candidate.display(), err);
                    if let Some(failure) = err.os_failure() {
                        last_os_failure = Some(failure);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        let (os_code, os_message) = match last_os_failure {
            Some((code, message)) => (code, Some(message)),
            None => (None, None),
        };
        Err(ComponentError::ComponentCreationFailed {
            filename: filename.to_string(),
            attempted,
            os_code,
            os_message,
        })
    }

    /// Create one component per registry entry that names an existing file.
    ///
    /// The registry is copied first so its lock is not held while libraries
    /// load. Known failures are logged and skipped. A panic in component
    /// code is returned as an error in debug builds and skipped in release
    /// builds. Returns the number of components appended to `out`.
    pub fn create_all(
        &self,
        iid: InterfaceId,
        out: &mut Vec<RefPtr<dyn Unknown>>,
    ) -> Result<usize, ComponentError> {
        let mut appended = 0;

        for (key, path) in self.registry.snapshot() {
            if !utils::is_file(&path) {
                debug!("Skipping registry entry '{}': '{}' is not a file", key, path);
                continue;
            }

            match self.create_from_path(iid, Path::new(&path)) {
                Ok(created) if created.instance.is_valid() => {
                    out.push(created.instance);
                    appended += 1;
                }
                Ok(_) => debug!("Component '{}' does not support interface {}", key, iid),
                Err(err) if err.is_known() => warn!("Skipping component '{}': {}", key, err),
                Err(err) => {
                    error!("Unexpected error creating component '{}': {}", key, err);
                    if cfg!(debug_assertions) {
                        return Err(err);
                    }
                }
            }
        }

        Ok(appended)
    }

    /// Create a component, turning the failures `policy` does not propagate
    /// into `Ok(None)`.
    pub fn create_quietly(
        &self,
        iid: InterfaceId,
        name: &str,
        policy: ErrorPolicy,
    ) -> Result<Option<RefPtr<dyn Unknown>>, ComponentError> {
        match self.create(iid, name) {
            Ok(instance) => Ok(Some(instance)),
            Err(err) if err.is_unexpected() => {
                error!("Unexpected error creating component '{}': {}", name, err);
                if policy.propagate_unexpected { Err(err) } else { Ok(None) }
            }
            Err(err) => {
                if policy.propagate_expected {
                    Err(err)
                } else {
                    debug!("Ignoring failure creating component '{}': {}", name, err);
                    Ok(None)
                }
            }
        }
    }

    /// Empty the library pool. See [`LibraryPool::release_all`].
    pub fn release_libraries(&self) -> usize {
        self.pool.release_all()
    }
}

/// Run component code, turning a panic into an error.
fn call_component<R>(
    library: &Library,
    operation: &str,
    call: impl FnOnce() -> R,
) -> Result<R, ComponentError> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        error!(
            "Component code in '{}' panicked during '{}': {}",
            library.filename().display(),
            operation,
            message
        );
        ComponentError::ComponentPanicked {
            library: library.filename().to_path_buf(),
            operation: operation.to_string(),
            message,
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

