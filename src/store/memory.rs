//! In-memory content store.
//!
//! All data is ephemeral and lost when the store is dropped.

use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use super::{ChangeKind, ContentStore, FileChange, FileStat, FileType, WriteOptions};
use crate::error::{FsError, FsResult};
use crate::event::{Disposable, Emitter, Listener};
use crate::uri::{path, Uri};

const ROOT: &str = "/";

/// Entry in the memory store.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, ctime: i64, mtime: i64 },
    Directory { ctime: i64, mtime: i64 },
}

impl Entry {
    fn directory() -> Self {
        let now = now_millis();
        Self::Directory { ctime: now, mtime: now }
    }

    fn stat(&self) -> FileStat {
        match self {
            Self::File { data, ctime, mtime } => FileStat {
                file_type: FileType::File,
                ctime: *ctime,
                mtime: *mtime,
                size: data.len() as u64,
            },
            Self::Directory { ctime, mtime } => FileStat {
                file_type: FileType::Directory,
                ctime: *ctime,
                mtime: *mtime,
                size: 0,
            },
        }
    }

    fn file_type(&self) -> FileType {
        match self {
            Self::File { .. } => FileType::File,
            Self::Directory { .. } => FileType::Directory,
        }
    }

    fn touch(&mut self) {
        match self {
            Self::File { mtime, .. } | Self::Directory { mtime, .. } => *mtime = now_millis(),
        }
    }
}

/// In-memory [`ContentStore`], keyed by normalized path.
///
/// Scheme and authority of incoming addresses are ignored; change events
/// carry `file` URIs. Thread-safe via internal locks.
pub struct MemStore {
    entries: RwLock<FxHashMap<String, Entry>>,
    watches: Arc<Mutex<FxHashMap<String, usize>>>,
    emitter: Emitter<[FileChange]>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    /// Create a store holding only the root directory.
    pub fn new() -> Self {
        let mut entries = FxHashMap::default();
        entries.insert(ROOT.to_string(), Entry::directory());
        Self {
            entries: RwLock::new(entries),
            watches: Arc::new(Mutex::new(FxHashMap::default())),
            emitter: Emitter::new(),
        }
    }

    /// Number of active watches on an address.
    pub fn watch_count(&self, uri: &Uri) -> usize {
        self.watches.lock().get(&key(uri)).copied().unwrap_or(0)
    }

    /// Number of entries, the root included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if only the root exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    fn fire(&self, changes: Vec<FileChange>) {
        if !changes.is_empty() {
            self.emitter.fire(&changes);
        }
    }
}

impl ContentStore for MemStore {
    fn stat(&self, uri: &Uri) -> FsResult<FileStat> {
        let key = key(uri);
        self.entries
            .read()
            .get(&key)
            .map(Entry::stat)
            .ok_or(FsError::NotFound(key))
    }

    fn read_directory(&self, uri: &Uri) -> FsResult<Vec<(String, FileType)>> {
        let key = key(uri);
        let entries = self.entries.read();
        match entries.get(&key) {
            Some(Entry::Directory { .. }) => {}
            Some(Entry::File { .. }) => return Err(FsError::NotADirectory(key)),
            None => return Err(FsError::NotFound(key)),
        }

        let mut children: Vec<(String, FileType)> = entries
            .iter()
            .filter(|(child, _)| parent_of(child) == Some(key.as_str()))
            .map(|(child, entry)| (path::basename(child).to_string(), entry.file_type()))
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children)
    }

    fn read_file(&self, uri: &Uri) -> FsResult<Vec<u8>> {
        let key = key(uri);
        match self.entries.read().get(&key) {
            Some(Entry::File { data, .. }) => Ok(data.clone()),
            Some(Entry::Directory { .. }) => Err(FsError::IsDirectory(key)),
            None => Err(FsError::NotFound(key)),
        }
    }

    fn write_file(&self, uri: &Uri, content: &[u8], options: WriteOptions) -> FsResult<()> {
        let key = key(uri);
        let parent = parent_of(&key).ok_or_else(|| FsError::IsDirectory(key.clone()))?;

        let kind = {
            let mut entries = self.entries.write();
            match entries.get(parent) {
                Some(Entry::Directory { .. }) => {}
                Some(Entry::File { .. }) => return Err(FsError::NotADirectory(parent.to_string())),
                None => return Err(FsError::NotFound(parent.to_string())),
            }

            let now = now_millis();
            match entries.get_mut(&key) {
                Some(Entry::Directory { .. }) => return Err(FsError::IsDirectory(key)),
                Some(_) if options.create && !options.overwrite => {
                    return Err(FsError::FileExists(key));
                }
                Some(Entry::File { data, mtime, .. }) => {
                    *data = content.to_vec();
                    *mtime = now;
                    ChangeKind::Changed
                }
                None if !options.create => return Err(FsError::NotFound(key)),
                None => {
                    let parent = parent.to_string();
                    entries.insert(
                        key.clone(),
                        Entry::File {
                            data: content.to_vec(),
                            ctime: now,
                            mtime: now,
                        },
                    );
                    if let Some(dir) = entries.get_mut(&parent) {
                        dir.touch();
                    }
                    ChangeKind::Created
                }
            }
        };

        self.fire(vec![FileChange::new(kind, Uri::file(key))]);
        Ok(())
    }

    fn delete(&self, uri: &Uri) -> FsResult<()> {
        let key = key(uri);
        let parent = parent_of(&key)
            .ok_or_else(|| FsError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "cannot delete the store root",
            )))?
            .to_string();

        {
            let mut entries = self.entries.write();
            if entries.remove(&key).is_none() {
                return Err(FsError::NotFound(key));
            }
            let prefix = format!("{key}/");
            entries.retain(|path, _| !path.starts_with(&prefix));
            if let Some(dir) = entries.get_mut(&parent) {
                dir.touch();
            }
        }

        self.fire(vec![
            FileChange::new(ChangeKind::Changed, Uri::file(parent)),
            FileChange::new(ChangeKind::Deleted, Uri::file(key)),
        ]);
        Ok(())
    }

    fn create_directory(&self, uri: &Uri) -> FsResult<()> {
        let key = key(uri);
        let parent = parent_of(&key)
            .ok_or_else(|| FsError::FileExists(key.clone()))?
            .to_string();

        {
            let mut entries = self.entries.write();
            match entries.get(&parent) {
                Some(Entry::Directory { .. }) => {}
                Some(Entry::File { .. }) => return Err(FsError::NotADirectory(parent)),
                None => return Err(FsError::NotFound(parent)),
            }
            if entries.contains_key(&key) {
                return Err(FsError::FileExists(key));
            }
            entries.insert(key.clone(), Entry::directory());
            if let Some(dir) = entries.get_mut(&parent) {
                dir.touch();
            }
        }

        self.fire(vec![
            FileChange::new(ChangeKind::Changed, Uri::file(parent)),
            FileChange::new(ChangeKind::Created, Uri::file(key)),
        ]);
        Ok(())
    }

    fn watch(&self, uri: &Uri) -> Disposable {
        let key = key(uri);
        *self.watches.lock().entry(key.clone()).or_insert(0) += 1;

        let watches: Weak<Mutex<FxHashMap<String, usize>>> = Arc::downgrade(&self.watches);
        Disposable::new(move || {
            let Some(watches) = watches.upgrade() else {
                return;
            };
            let mut watches = watches.lock();
            if let Some(count) = watches.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    watches.remove(&key);
                }
            }
        })
    }

    fn on_did_change(&self, listener: Listener<[FileChange]>) -> Disposable {
        self.emitter.subscribe(listener)
    }
}

/// Store key for an address: absolute, normalized, no trailing separator.
fn key(uri: &Uri) -> String {
    let normalized = path::normalize(&format!("/{}", uri.path()));
    match normalized.trim_end_matches('/') {
        "" => ROOT.to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn parent_of(key: &str) -> Option<&str> {
    if key == ROOT {
        return None;
    }
    match key.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&key[..idx]),
        None => None,
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
