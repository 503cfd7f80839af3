//! Path-based view of a content store for install engines.

use std::sync::Arc;

use super::{ContentStore, FileType, WriteOptions};
use crate::error::{FsError, FsResult};
use crate::uri::Uri;

/// The surface an install engine writes packages through.
///
/// Paths are plain absolute paths; they are addressed in the store as `file`
/// URIs, the same addresses the provider reads from.
#[derive(Clone)]
pub struct StoreHost {
    store: Arc<dyn ContentStore>,
}

impl StoreHost {
    /// Wrap a store.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Names of the direct children of a directory.
    pub fn read_directory(&self, path: &str) -> FsResult<Vec<String>> {
        Ok(self
            .store
            .read_directory(&Uri::file(path))?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Remove a file or directory.
    pub fn delete_file(&self, path: &str) -> FsResult<()> {
        self.store.delete(&Uri::file(path))
    }

    /// Create a directory and any missing ancestors.
    pub fn create_directory(&self, path: &str) -> FsResult<()> {
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            if self.directory_exists(&current) {
                continue;
            }
            match self.store.create_directory(&Uri::file(current.as_str())) {
                Ok(()) | Err(FsError::FileExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Write a text file, creating parent directories and replacing any
    /// existing content.
    pub fn write_file(&self, path: &str, data: &str) -> FsResult<()> {
        if let Some((parent, _)) = path.rsplit_once('/')
            && !parent.is_empty()
        {
            self.create_directory(parent)?;
        }
        self.store
            .write_file(&Uri::file(path), data.as_bytes(), WriteOptions::upsert())
    }

    /// Check whether a directory exists.
    pub fn directory_exists(&self, path: &str) -> bool {
        self.store
            .stat(&Uri::file(path))
            .is_ok_and(|stat| stat.file_type == FileType::Directory)
    }

    /// Read a text file, or `None` if it cannot be read.
    pub fn read_file(&self, path: &str) -> Option<String> {
        self.store
            .read_file(&Uri::file(path))
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}
