//! Dynamic libraries and the loader seam in front of the OS.
//!
//! [`LibraryLoader`] turns a path into a [`Module`] that can look up
//! exported functions. [`SystemLoader`] is the real implementation on top
//! of `libloading`; tests substitute in-process fakes.
use std::error::Error as _;
use std::ffi::c_void;
use std::fmt;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use log::debug;

use crate::component::error::ComponentError;

/// Address of an exported function, not yet given a signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawFunction(NonNull<c_void>);

// SAFETY: a code address carries no thread affinity.
unsafe impl Send for RawFunction {}
unsafe impl Sync for RawFunction {}

impl RawFunction {
    pub fn new(address: *const c_void) -> Option<Self> {
        NonNull::new(address.cast_mut()).map(Self)
    }

    pub fn address(self) -> *const c_void {
        self.0.as_ptr().cast_const()
    }

    /// Reinterpret the address as the function pointer type `F`.
    ///
    /// # Safety
    /// `F` must be a function pointer type matching the real signature and
    /// calling convention of the exported function.
    pub unsafe fn cast<F: Copy>(self) -> F {
        const { assert!(mem::size_of::<F>() == mem::size_of::<*const c_void>()) };
        unsafe { mem::transmute_copy::<NonNull<c_void>, F>(&self.0) }
    }
}

impl fmt::Debug for RawFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawFunction({:p})", self.0)
    }
}

/// A loaded library image.
pub trait Module: Send + Sync {
    /// Look up an exported function by symbol name.
    fn function(&self, name: &str) -> Option<RawFunction>;
}

/// Loads library images from paths.
pub trait LibraryLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn Module>, LoadFailure>;
}

/// Why a library could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub os_code: Option<i32>,
    pub message: String,
}

impl LoadFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            os_code: None,
            message: message.into(),
        }
    }

    pub fn with_os_code(mut self, code: i32) -> Self {
        self.os_code = Some(code);
        self
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.os_code {
            Some(code) => write!(f, "{} (system error {code})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A library loaded from `filename`. The image is unloaded when the last
/// handle is dropped.
pub struct Library {
    filename: PathBuf,
    module: Box<dyn Module>,
}

impl Library {
    pub fn new(filename: impl Into<PathBuf>, module: Box<dyn Module>) -> Self {
        Self {
            filename: filename.into(),
            module,
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn function(&self, name: &str) -> Option<RawFunction> {
        self.module.function(name)
    }

    /// Like [`function`](Self::function), but a missing export is an error.
    pub fn require(&self, name: &str) -> Result<RawFunction, ComponentError> {
        self.function(name)
            .ok_or_else(|| ComponentError::ExportedFunctionNotFound {
                name: name.to_string(),
                library: self.filename.clone(),
            })
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        debug!("Unloading library '{}'", self.filename.display());
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// Loads libraries through the operating system's dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

impl LibraryLoader for SystemLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Module>, LoadFailure> {
        // SAFETY: loading runs the library's initialisers. Component
        // libraries are trusted code.
        match unsafe { libloading::Library::new(path) } {
            Ok(library) => Ok(Box::new(SystemModule { library })),
            Err(err) => {
                let failure = LoadFailure::new(err.to_string());
                Err(match os_code(&err) {
                    Some(code) => failure.with_os_code(code),
                    None => failure,
                })
            }
        }
    }
}

/// The system error number behind a loader error, where the platform
/// reports one. `dlopen` does not set `errno`, so only Windows has a code.
fn os_code(err: &libloading::Error) -> Option<i32> {
    err.source()
        .and_then(|source| source.downcast_ref::<io::Error>())
        .and_then(io::Error::raw_os_error)
}

struct SystemModule {
    library: libloading::Library,
}

impl Module for SystemModule {
    fn function(&self, name: &str) -> Option<RawFunction> {
        let mut symbol = Vec::with_capacity(name.len() + 1);
        symbol.extend_from_slice(name.as_bytes());
        symbol.push(0);
        // SAFETY: the symbol is read as a bare address; callers give it a
        // signature before calling.
        let address = unsafe { self.library.get::<*const c_void>(&symbol) }.ok()?;
        RawFunction::new(*address)
    }
}
