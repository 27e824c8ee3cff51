//! Filesystem helpers used by name resolution and plugin discovery.
pub mod fs;

use std::path::{Path, PathBuf};

pub use fs::{find_files, find_files_with_extension};

/// Check if a path exists
pub fn path_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists()
}

/// Check if a path is an existing regular file
pub fn is_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().is_file()
}

/// Check if a path is an existing directory
pub fn is_dir<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().is_dir()
}

/// Candidate path for `filename` inside `directory`. An empty directory
/// yields the filename unchanged.
pub fn join_candidate<P: AsRef<Path>>(directory: P, filename: &str) -> PathBuf {
    let directory = directory.as_ref();
    if directory.as_os_str().is_empty() {
        PathBuf::from(filename)
    } else {
        directory.join(filename)
    }
}

/// Normalise a file extension: leading dots are dropped and case is folded.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}
