//! Filesystem storage backend
//!
//! Writes mirrored content below a root directory, one file per URL.

use crate::storage::traits::{Storage, StorageError, StorageResult};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Name of the temporary file written to check the root for write access
const WRITE_CHECK_FILE: &str = ".site-mirror-write-check";

/// Storage backend writing to a directory tree
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Creates a backend rooted at `root`; the directory is created lazily
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins a relative path onto the root, rejecting anything that could escape it
    fn resolve(&self, relative: &Path) -> StorageResult<PathBuf> {
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if !safe || relative.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath(relative.to_path_buf()));
        }

        Ok(self.root.join(relative))
    }
}

impl Storage for FsStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    fn save(&self, relative: &Path, content: &[u8]) -> StorageResult<PathBuf> {
        let target = self.resolve(relative)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&target, content).map_err(|source| StorageError::Write {
            path: target.clone(),
            source,
        })?;

        Ok(target)
    }

    fn exists(&self, relative: &Path) -> bool {
        self.resolve(relative)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    fn check_writable(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(|source| StorageError::CreateDir {
            path: self.root.clone(),
            source,
        })?;

        let marker = self.root.join(WRITE_CHECK_FILE);
        fs::write(&marker, b"").map_err(|source| StorageError::Write {
            path: marker.clone(),
            source,
        })?;
        fs::remove_file(&marker)?;

        Ok(())
    }
}
