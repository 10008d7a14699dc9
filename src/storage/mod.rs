//! Storage module for persisting mirrored content
//!
//! This module handles writing fetched pages and assets below the output root:
//! - Creating parent directories on demand
//! - Overwriting earlier copies (last write wins)
//! - Detecting assets left over from a previous partial run
//! - Verifying the output root is writable before a crawl starts

mod filesystem;
mod traits;

pub use filesystem::FsStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::MirrorError;
use std::path::Path;

/// Opens the output directory and verifies it accepts writes
///
/// An unwritable output root is the one persistence failure that is fatal to a
/// run, so it is checked before any request is made.
///
/// # Arguments
///
/// * `path` - Root directory of the mirror
///
/// # Returns
///
/// * `Ok(FsStorage)` - Storage rooted at `path`
/// * `Err(MirrorError)` - The directory could not be created or written
pub fn open_storage(path: &Path) -> Result<FsStorage, MirrorError> {
    let storage = FsStorage::new(path);
    storage
        .check_writable()
        .map_err(|e| MirrorError::OutputRootUnwritable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(storage)
}
