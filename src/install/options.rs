//! Reading manifest and lockfiles from the real project.

use std::fs;
use std::io;

use super::InstallOptions;
use crate::config::Config;
use crate::store::{ContentStore, MemStore};
use crate::uri::{path, Uri};

/// Read access to the real project files.
pub trait ProjectFs: Send + Sync {
    /// Read a file addressed by its real URI.
    fn read_file(&self, uri: &Uri) -> io::Result<Vec<u8>>;
}

/// [`ProjectFs`] backed by the local disk. Only `file` URIs are readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl ProjectFs for DiskFs {
    fn read_file(&self, uri: &Uri) -> io::Result<Vec<u8>> {
        if uri.scheme() != "file" {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported scheme: {}", uri.scheme()),
            ));
        }
        fs::read(uri.path())
    }
}

impl ProjectFs for MemStore {
    fn read_file(&self, uri: &Uri) -> io::Result<Vec<u8>> {
        ContentStore::read_file(self, uri).map_err(|e| match e {
            crate::error::FsError::Io(e) => e,
            other if other.is_not_found() => {
                io::Error::new(io::ErrorKind::NotFound, other.to_string())
            }
            other => io::Error::other(other.to_string()),
        })
    }
}

/// Read the manifest and both lockfiles at `root`.
///
/// Files are addressed with the scheme and authority of `original`, the real
/// address a request wrapped. Nothing is cached: every call reads afresh.
pub fn read_install_options(
    fs: &dyn ProjectFs,
    original: &Uri,
    root: &str,
    config: &Config,
) -> InstallOptions {
    let read = |name: &str| {
        let uri = original.with_path(path::join([root, name]));
        fs.read_file(&uri).ok().map(|bytes| decode_text(&bytes))
    };

    InstallOptions {
        manifest: read(&config.manifest_file),
        kdl_lock: read(&config.kdl_lockfile),
        npm_lock: read(&config.npm_lockfile),
    }
}

/// Decode bytes as UTF-8, stripping BOM if present. Invalid sequences are
/// replaced rather than rejected.
fn decode_text(buf: &[u8]) -> String {
    let buf = buf.strip_prefix(b"\xef\xbb\xbf").unwrap_or(buf);
    String::from_utf8_lossy(buf).into_owned()
}
