//! Process-wide component state.
//!
//! A [`ComponentContext`] owns the name registry and the library pool that
//! loaders and managers share. Most programs use the lazily created
//! [`ComponentContext::global`]; tests and embedders that need isolation
//! build their own.
use std::sync::{Arc, OnceLock};

use log::debug;

use crate::component::library::{LibraryLoader, SystemLoader};
use crate::component::manager::ComponentManager;
use crate::component::object::ComponentLoader;
use crate::component::pool::LibraryPool;
use crate::component::registry::Registry;
use crate::storage::config::LoaderConfig;

static GLOBAL: OnceLock<ComponentContext> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct ComponentContext {
    registry: Arc<Registry>,
    pool: Arc<LibraryPool>,
}

impl ComponentContext {
    /// A context whose pool loads libraries through `loader`.
    pub fn new(loader: Arc<dyn LibraryLoader>) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            pool: Arc::new(LibraryPool::new(loader)),
        }
    }

    /// A context loading libraries from disk through the OS loader.
    pub fn with_system_loader() -> Self {
        Self::new(Arc::new(SystemLoader))
    }

    /// A system-loader context with its registry populated from `config`.
    pub fn from_config(config: &LoaderConfig) -> Self {
        let context = Self::with_system_loader();
        config.apply_to(&context.registry);
        context
    }

    /// The shared process-wide context, created on first use.
    pub fn global() -> &'static ComponentContext {
        GLOBAL.get_or_init(|| {
            debug!("Creating global component context");
            Self::with_system_loader()
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn pool(&self) -> &Arc<LibraryPool> {
        &self.pool
    }

    /// A loader sharing this context's registry and pool.
    pub fn loader(&self) -> ComponentLoader {
        ComponentLoader::new(Arc::clone(&self.registry), Arc::clone(&self.pool))
    }

    /// An empty plugin manager using this context's loader.
    pub fn manager(&self) -> ComponentManager {
        ComponentManager::new(self.loader())
    }
}
