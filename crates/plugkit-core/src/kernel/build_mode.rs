use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a binary was compiled with debug assertions.
///
/// Host and component libraries must agree; allocator and layout
/// assumptions differ between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// Build mode of the current compilation unit.
    pub const fn current() -> Self {
        Self::from_debug_flag(cfg!(debug_assertions))
    }

    pub const fn from_debug_flag(is_debug: bool) -> Self {
        if is_debug { BuildMode::Debug } else { BuildMode::Release }
    }

    pub const fn is_debug(self) -> bool {
        matches!(self, BuildMode::Debug)
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Debug => write!(f, "Debug"),
            BuildMode::Release => write!(f, "Release"),
        }
    }
}
