//! Error types and process exit statuses.

use std::io;
use std::path::PathBuf;

/// Successful run.
pub const EX_OK: i32 = 0;
/// Maximum include depth exceeded.
pub const EX_MAX_INCLUDE_DEPTH: i32 = 2;
/// `#ifdef`/`#ifndef` and `#endif` do not pair up.
pub const EX_IF_NOMATCH: i32 = 3;
/// Command line usage error (sysexits `EX_USAGE`).
pub const EX_USAGE: i32 = 64;
/// Input/output error (sysexits `EX_IOERR`).
pub const EX_IOERR: i32 = 74;
/// Configuration file error (sysexits `EX_CONFIG`).
pub const EX_CONFIG: i32 = 78;

/// A fatal preprocessing failure. Every variant aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    /// Opening, reading or writing a file failed.
    #[error("{source}: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `#include` nested deeper than the configured maximum.
    #[error("{}:{line}: #include reached to max depth ({max})", path.display())]
    MaxIncludeDepth { path: PathBuf, line: usize, max: usize },

    /// `#endif` with no open `#ifdef`/`#ifndef`.
    #[error("{}:{line}: #endif without matching #ifdef/#ifndef", path.display())]
    UnmatchedEndif { path: PathBuf, line: usize },

    /// Input ended with conditionals still open.
    #[error("#if(n)def - #endif not matched ({open} block(s) left open)")]
    UnmatchedConditional { open: usize },
}

impl PreprocessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this failure
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } => EX_IOERR,
            Self::MaxIncludeDepth { .. } => EX_MAX_INCLUDE_DEPTH,
            Self::UnmatchedEndif { .. } | Self::UnmatchedConditional { .. } => EX_IF_NOMATCH,
        }
    }
}
