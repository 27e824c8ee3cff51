#[cfg(test)]
mod object_tests;

use std::collections::HashMap;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::component::interface::{
    self, ClassFactory, Interface, InterfaceId, InterfaceRequest, Plugin, Unknown,
};
use crate::component::library::{LibraryLoader, LoadFailure, Module, RawFunction};
use crate::component::object::{ComponentLoader, DebugProbeFn, FactoryGetterFn};
use crate::component::pool::LibraryPool;
use crate::component::registry::Registry;
use crate::kernel::constants::{DEBUG_PROBE_SYMBOL, FACTORY_GETTER_SYMBOL};
use crate::pointer::{RefCount, RefPtr, Referenced};

/// A component that greets and can be managed as a plugin.
pub(super) struct Greeter {
    count: RefCount,
    name: String,
}

impl Greeter {
    pub(super) fn new(name: &str) -> Self {
        Self {
            count: RefCount::new(),
            name: name.to_string(),
        }
    }
}

impl Referenced for Greeter {
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

// SAFETY: every answer is `self`.
unsafe impl Unknown for Greeter {
    fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool {
        request.provide::<dyn Unknown>(self)
            || request.provide::<dyn Plugin>(self)
            || request.provide::<dyn Greeting>(self)
    }
}

impl Plugin for Greeter {
    fn plugin_name(&self) -> String {
        self.name.clone()
    }
}

pub(super) trait Greeting: Unknown {
    fn greet(&self, who: &str) -> String;
}

unsafe impl Interface for dyn Greeting {
    const IID: InterfaceId = InterfaceId(7_101);
    const NAME: &'static str = "Greeting";
}

impl Greeting for Greeter {
    fn greet(&self, who: &str) -> String {
        format!("{} says hello to {}", self.name, who)
    }
}

/// A component answering nothing but [`Unknown`].
pub(super) struct Anonymous {
    count: RefCount,
}

impl Anonymous {
    pub(super) fn new() -> Self {
        Self { count: RefCount::new() }
    }
}

impl Referenced for Anonymous {
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

// SAFETY: every answer is `self`.
unsafe impl Unknown for Anonymous {
    fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool {
        request.provide::<dyn Unknown>(self)
    }
}

enum Product {
    Greeter(&'static str),
    Anonymous,
    Panic,
}

struct TestFactory {
    count: RefCount,
    product: Product,
}

impl TestFactory {
    fn boxed(product: Product) -> RefPtr<dyn ClassFactory> {
        let factory: Box<dyn ClassFactory> = Box::new(Self {
            count: RefCount::new(),
            product,
        });
        RefPtr::from_box(factory)
    }
}

impl Referenced for TestFactory {
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

// SAFETY: every answer is `self`.
unsafe impl Unknown for TestFactory {
    fn query_interface(&self, request: &mut InterfaceRequest<'_>) -> bool {
        request.provide::<dyn Unknown>(self) || request.provide::<dyn ClassFactory>(self)
    }
}

impl ClassFactory for TestFactory {
    fn create_instance(&self, iid: InterfaceId) -> RefPtr<dyn Unknown> {
        let component: Box<dyn Unknown> = match self.product {
            Product::Greeter(name) => Box::new(Greeter::new(name)),
            Product::Anonymous => Box::new(Anonymous::new()),
            Product::Panic => panic!("factory exploded"),
        };
        if interface::supports(component.as_ref(), iid) {
            RefPtr::from_box(component)
        } else {
            RefPtr::empty()
        }
    }
}

pub(super) fn current_probe() -> bool {
    cfg!(debug_assertions)
}

pub(super) extern "C" fn current_mode_probe() -> bool {
    current_probe()
}

pub(super) fn alpha_getter() -> RefPtr<dyn ClassFactory> {
    TestFactory::boxed(Product::Greeter("alpha"))
}

pub(super) fn beta_getter() -> RefPtr<dyn ClassFactory> {
    TestFactory::boxed(Product::Greeter("beta"))
}

pub(super) fn anonymous_getter() -> RefPtr<dyn ClassFactory> {
    TestFactory::boxed(Product::Anonymous)
}

pub(super) fn exploding_factory_getter() -> RefPtr<dyn ClassFactory> {
    TestFactory::boxed(Product::Panic)
}

pub(super) fn null_getter() -> RefPtr<dyn ClassFactory> {
    RefPtr::empty()
}

pub(super) fn panicking_getter() -> RefPtr<dyn ClassFactory> {
    panic!("getter exploded")
}

/// The exports of an in-process fake library.
#[derive(Clone, Copy, Default)]
pub(super) struct FakeLibrary {
    probe: Option<DebugProbeFn>,
    getter: Option<FactoryGetterFn>,
}

impl FakeLibrary {
    /// Both exports, built in the current mode.
    pub(super) fn component(getter: FactoryGetterFn) -> Self {
        Self {
            probe: Some(current_mode_probe),
            getter: Some(getter),
        }
    }

    pub(super) fn exports(probe: Option<DebugProbeFn>, getter: Option<FactoryGetterFn>) -> Self {
        Self { probe, getter }
    }
}

impl Module for FakeLibrary {
    fn function(&self, name: &str) -> Option<RawFunction> {
        match name {
            DEBUG_PROBE_SYMBOL => self
                .probe
                .and_then(|probe| RawFunction::new(probe as *const c_void)),
            FACTORY_GETTER_SYMBOL => self
                .getter
                .and_then(|getter| RawFunction::new(getter as *const c_void)),
            _ => None,
        }
    }
}

/// Loader serving [`FakeLibrary`] images and counting load attempts.
/// Unknown paths fail the way a missing file does.
#[derive(Default)]
pub(super) struct FakeLoader {
    libraries: HashMap<PathBuf, FakeLibrary>,
    loads: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeLoader {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn with(mut self, path: impl AsRef<Path>, library: FakeLibrary) -> Self {
        self.libraries
            .insert(LibraryPool::normalize(path.as_ref()), library);
        self
    }

    pub(super) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(super) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl LibraryLoader for FakeLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Module>, LoadFailure> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        match self.libraries.get(path) {
            Some(library) => Ok(Box::new(*library)),
            None => Err(LoadFailure::new(format!(
                "{}: cannot open shared object file: No such file or directory",
                path.display()
            ))
            .with_os_code(2)),
        }
    }
}

/// A loader with an empty registry over a pool backed by `fake`.
pub(super) fn fake_loader(fake: FakeLoader) -> (ComponentLoader, Arc<FakeLoader>) {
    let fake = Arc::new(fake);
    let pool = Arc::new(LibraryPool::new(fake.clone()));
    (ComponentLoader::new(Arc::new(Registry::new()), pool), fake)
}
