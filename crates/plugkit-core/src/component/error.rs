//! # Component Errors
//!
//! Failures of name resolution, library loading and component creation.
//!
//! *Expected* failures are the ones a search over candidate libraries runs
//! into routinely: a file that is not a loadable library, or a library
//! without the component exports. The search moves on to the next
//! candidate. Every variant except [`ComponentError::ComponentPanicked`]
//! belongs to the *known* taxonomy; a panic inside component code is the
//! one unexpected failure.
use std::path::PathBuf;

use thiserror::Error;

use crate::component::library::LoadFailure;
use crate::kernel::build_mode::BuildMode;
use crate::kernel::constants::codes;
use crate::pointer::error::PointerError;

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Error {}: registry key '{key}' not found", codes::REGISTRY_KEY_NOT_FOUND)]
    RegistryKeyNotFound { key: String },

    #[error(
        "Error {}: failed to load library '{path}'{}: {message}",
        codes::LIBRARY_LOAD_FAILED,
        os_code.map(|code| format!(" (system error {code})")).unwrap_or_default()
    )]
    LibraryLoadFailed {
        path: PathBuf,
        os_code: Option<i32>,
        message: String,
    },

    #[error(
        "Error {}: failed to find function '{name}' in library '{library}'",
        codes::EXPORTED_FUNCTION_NOT_FOUND
    )]
    ExportedFunctionNotFound { name: String, library: PathBuf },

    #[error(
        "Error {}: mismatched build modes; loader is {loader_mode}, library '{library}' is {library_mode}",
        codes::MISMATCHED_BUILD_MODES
    )]
    MismatchedBuildModes {
        library: PathBuf,
        loader_mode: BuildMode,
        library_mode: BuildMode,
    },

    #[error(
        "Error {}: failed to create component from file '{filename}'; paths used: [{}]; system error number: {}; system error message: {}",
        codes::COMPONENT_CREATION_FAILED,
        join_paths(attempted),
        os_code.map(|code| code.to_string()).unwrap_or_else(|| "none".into()),
        os_message.as_deref().unwrap_or("none")
    )]
    ComponentCreationFailed {
        filename: String,
        attempted: Vec<PathBuf>,
        os_code: Option<i32>,
        os_message: Option<String>,
    },

    #[error(
        "Error {}: component code in '{library}' panicked during '{operation}': {message}",
        codes::COMPONENT_PANICKED
    )]
    ComponentPanicked {
        library: PathBuf,
        operation: String,
        message: String,
    },

    #[error(transparent)]
    Pointer(#[from] PointerError),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ComponentError {
    pub(crate) fn load_failed(path: impl Into<PathBuf>, failure: &LoadFailure) -> Self {
        ComponentError::LibraryLoadFailed {
            path: path.into(),
            os_code: failure.os_code,
            message: failure.message.clone(),
        }
    }

    /// Stable diagnostic code of this error.
    pub fn code(&self) -> u32 {
        match self {
            ComponentError::RegistryKeyNotFound { .. } => codes::REGISTRY_KEY_NOT_FOUND,
            ComponentError::LibraryLoadFailed { .. } => codes::LIBRARY_LOAD_FAILED,
            ComponentError::ExportedFunctionNotFound { .. } => codes::EXPORTED_FUNCTION_NOT_FOUND,
            ComponentError::MismatchedBuildModes { .. } => codes::MISMATCHED_BUILD_MODES,
            ComponentError::ComponentCreationFailed { .. } => codes::COMPONENT_CREATION_FAILED,
            ComponentError::ComponentPanicked { .. } => codes::COMPONENT_PANICKED,
            ComponentError::Pointer(err) => err.code(),
        }
    }

    /// Failures a search over candidate libraries skips past.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ComponentError::LibraryLoadFailed { .. }
                | ComponentError::ExportedFunctionNotFound { .. }
        )
    }

    pub fn is_known(&self) -> bool {
        !self.is_unexpected()
    }

    /// Failures no caller anticipates.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, ComponentError::ComponentPanicked { .. })
    }

    /// OS error details carried by a load failure.
    pub fn os_failure(&self) -> Option<(Option<i32>, String)> {
        match self {
            ComponentError::LibraryLoadFailed {
                os_code, message, ..
            } => Some((*os_code, message.clone())),
            _ => None,
        }
    }
}
