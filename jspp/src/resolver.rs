//! Include path resolution
//!
//! Relative include paths resolve against the directory of the file that
//! contains the `#include` line. The base directory is threaded explicitly
//! through the recursion instead of changing the process working directory,
//! so nothing needs restoring when an include fails.

use std::io;
use std::path::{Path, PathBuf};

/// A resolved `#include` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeTarget {
    /// Path to open
    pub path: PathBuf,
    /// Base directory for includes found inside `path`
    pub base_dir: PathBuf,
}

/// Resolve `raw` against the including file's base directory.
///
/// An empty base directory stands for the invocation directory. Absolute
/// include paths ignore the base.
#[must_use]
pub fn resolve_include(base_dir: &Path, raw: &Path) -> IncludeTarget {
    let path = base_dir.join(raw);
    let base_dir = base_dir_of(&path);
    IncludeTarget { path, base_dir }
}

/// Base directory for a top-level input file: its parent, or empty when the
/// file is named without a directory component.
#[must_use]
pub fn base_dir_of(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Turn the raw bytes captured from an `#include` line into a path.
///
/// On Unix any byte sequence is a valid path and is used as is.
///
/// # Errors
///
/// Never fails on Unix.
#[cfg(unix)]
#[allow(clippy::unnecessary_wraps)]
pub fn include_path(raw: &[u8]) -> io::Result<&Path> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    Ok(Path::new(OsStr::from_bytes(raw)))
}

/// Turn the raw bytes captured from an `#include` line into a path.
///
/// Elsewhere paths are Unicode, so the bytes must be UTF-8.
///
/// # Errors
///
/// Returns an `InvalidData` error when `raw` is not UTF-8.
#[cfg(not(unix))]
pub fn include_path(raw: &[u8]) -> io::Result<&Path> {
    std::str::from_utf8(raw).map(Path::new).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("include path is not valid UTF-8 ({e})"),
        )
    })
}
