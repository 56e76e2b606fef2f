//! Error types shared across the engine.
//!
//! The scanner swallows and logs per-entry failures rather than surfacing
//! them; only conditions that change a caller's behaviour appear here.
//! The layouter and pick engine never return errors — their inputs are
//! guaranteed well-formed by the scanner, and violations are debug asserts.

use std::path::PathBuf;

/// Failures surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File or directory access failed.
    #[error("I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scan root is a regular file, not a directory.
    #[error("scan root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The path contains a `.` or `..` element and was refused.
    #[error("path contains a rejected element: {0}")]
    PathRejected(PathBuf),

    /// The OS watch registration failed.
    #[error("failed to watch filesystem: {0}")]
    WatchFailed(#[source] notify::Error),

    /// The operation was cancelled before completing.
    #[error("operation cancelled")]
    Cancelled,

    /// A search pattern failed to compile.
    #[error("invalid search pattern: {0}")]
    Regex(#[from] regex::Error),
}
