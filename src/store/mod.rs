//! Content store abstraction.
//!
//! The store holds the bytes of every materialized package file. The
//! provider never reaches into it directly: it hands over addresses and gets
//! whole results back.
//!
//! ```text
//! ┌──────────────┐  write_file / create_directory   ┌──────────────┐
//! │ install      │ ───────────── StoreHost ───────► │ ContentStore │
//! │ engine       │                                  │ (MemStore)   │
//! └──────────────┘                                  └──────┬───────┘
//!                                                          │ stat / read_*
//!                                   ┌──────────────────────┴───────┐
//!                                   │ AutoInstallFs (read-only)    │
//!                                   └──────────────────────────────┘
//! ```

mod host;
mod memory;

pub use host::StoreHost;
pub use memory::MemStore;

use crate::error::FsResult;
use crate::event::{Disposable, Listener};
use crate::uri::Uri;

/// Kind of a store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// Metadata of a store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Entry kind.
    pub file_type: FileType,
    /// Creation time, milliseconds since the Unix epoch.
    pub ctime: i64,
    /// Modification time, milliseconds since the Unix epoch.
    pub mtime: i64,
    /// Size in bytes (0 for directories).
    pub size: u64,
}

impl FileStat {
    /// An empty directory with zeroed timestamps.
    pub const fn synthetic_directory() -> Self {
        Self {
            file_type: FileType::Directory,
            ctime: 0,
            mtime: 0,
            size: 0,
        }
    }
}

/// Flags for [`ContentStore::write_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Create the file if it does not exist.
    pub create: bool,
    /// Replace the file if it exists.
    pub overwrite: bool,
}

impl WriteOptions {
    /// Create or replace.
    pub const fn upsert() -> Self {
        Self {
            create: true,
            overwrite: true,
        }
    }
}

/// What happened to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Entry was created.
    Created,
    /// Entry content or listing changed.
    Changed,
    /// Entry was removed.
    Deleted,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Change kind.
    pub kind: ChangeKind,
    /// Address of the changed entry.
    pub uri: Uri,
}

impl FileChange {
    /// Create a change notification.
    pub fn new(kind: ChangeKind, uri: Uri) -> Self {
        Self { kind, uri }
    }
}

/// An addressable hierarchical store of files and directories.
///
/// Implementations own their consistency; every method is a whole operation.
pub trait ContentStore: Send + Sync {
    /// Metadata of an entry.
    fn stat(&self, uri: &Uri) -> FsResult<FileStat>;

    /// Direct children of a directory as `(name, type)` pairs.
    fn read_directory(&self, uri: &Uri) -> FsResult<Vec<(String, FileType)>>;

    /// Content of a file.
    fn read_file(&self, uri: &Uri) -> FsResult<Vec<u8>>;

    /// Write a file according to `options`.
    fn write_file(&self, uri: &Uri, content: &[u8], options: WriteOptions) -> FsResult<()>;

    /// Remove an entry.
    fn delete(&self, uri: &Uri) -> FsResult<()>;

    /// Create a directory whose parent exists.
    fn create_directory(&self, uri: &Uri) -> FsResult<()>;

    /// Start watching an entry. The watch ends when the handle is disposed.
    fn watch(&self, uri: &Uri) -> Disposable;

    /// Subscribe to batches of change notifications.
    fn on_did_change(&self, listener: Listener<[FileChange]>) -> Disposable;
}
