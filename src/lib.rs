//! # autoinstall-fs
//!
//! A read-only virtual filesystem that makes dependency trees
//! (`node_modules`) look fully installed while packages are actually
//! resolved and restored on demand.
//!
//! - **Lazy installs**: the first read under a project's `node_modules`
//!   resolves and restores that project through an [`InstallEngine`]
//! - **Per-project serialization**: installs for one project root run one at a
//!   time, in submission order; different roots install in parallel
//! - **Wrapped addressing**: virtual URIs carry the real address in their path
//!   (`memfs://auth/file/<authority>/proj/node_modules/...`)
//! - **Fresh inputs**: manifest and lockfiles are re-read on every install
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use autoinstall_fs::prelude::*;
//!
//! let store = Arc::new(MemStore::new());
//! let engine = Arc::new(MyEngine::new(StoreHost::new(store.clone())));
//! let fs = AutoInstallFs::builder(store, engine).build();
//!
//! let uri = Uri::parse("memfs://auth/file/ts-nul-authority/proj/node_modules/left-pad/index.js")?;
//! let bytes = fs.read_file(&uri)?;
//! ```
//!
//! ## Modules
//!
//! - [`uri`]: URIs and wrapped-address decoding
//! - [`store`]: Content store trait, in-memory store, install-engine host
//! - [`install`]: Install engine boundary and manifest/lockfile reading
//! - [`queue`]: Per-project FIFO install queue
//! - [`materialize`]: On-demand materialization
//! - [`provider`]: The read-only filesystem provider
//! - [`dnd`]: Drop-into-editor controller registry
//! - [`config`]: Runtime configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dnd;
pub mod error;
pub mod event;
pub mod install;
pub mod materialize;
pub mod provider;
pub mod queue;
pub mod store;
pub mod uri;

#[cfg(test)]
mod testing;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use autoinstall_fs::prelude::*;
/// ```
pub mod prelude {
    // Provider
    pub use crate::{AutoInstallFs, ProviderBuilder};

    // Addressing
    pub use crate::{MappedUri, Uri};

    // Store
    pub use crate::{ContentStore, FileStat, FileType, MemStore, StoreHost, WriteOptions};

    // Install engine
    pub use crate::{InstallEngine, InstallOptions, ProjectHandle};

    // Errors
    pub use crate::{BoxError, FsError, FsResult};
}

// =============================================================================
// Provider
// =============================================================================

pub use materialize::Materializer;
pub use provider::{AutoInstallFs, ProviderBuilder};
pub use queue::InstallQueue;

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Config, ConfigBuilder};
pub use dnd::{
    CancellationToken, DataTransfer, DragItem, DropController, DropControllerRegistry, Position,
};
pub use error::{BoxError, FsError, FsResult};
pub use event::{Disposable, Emitter, Listener, Registry};
pub use install::{
    DiskFs, InstallEngine, InstallOptions, ProjectFs, ProjectHandle, read_install_options,
};
pub use store::{
    ChangeKind, ContentStore, FileChange, FileStat, FileType, MemStore, StoreHost, WriteOptions,
};
pub use uri::{MappedUri, NUL_AUTHORITY, Uri};
