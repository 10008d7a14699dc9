//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Path escapes the output root: {0}")]
    InvalidPath(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for mirror storage backends
///
/// Paths handed to a backend are relative to its root, as produced by
/// [`crate::url::url_to_path`]. Implementations are shared across workers
/// and must be thread-safe.
pub trait Storage: Send + Sync {
    /// Returns the root directory of the mirror
    fn root(&self) -> &Path;

    /// Writes content to a relative path, creating parent directories as needed
    ///
    /// An existing file at that path is overwritten.
    ///
    /// # Returns
    ///
    /// The absolute path that was written
    fn save(&self, relative: &Path, content: &[u8]) -> StorageResult<PathBuf>;

    /// Returns true if a file already exists at the relative path
    fn exists(&self, relative: &Path) -> bool;

    /// Verifies that the root exists (creating it if needed) and accepts writes
    fn check_writable(&self) -> StorageResult<()>;
}
