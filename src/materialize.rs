//! On-demand package materialization.
//!
//! ```text
//! ensure_contents(uri)
//!     │
//!     ├─► decode ─────────────── MalformedPath
//!     ├─► outside node_modules ─ NotFound
//!     ├─► reserved namespace ─── NotFound
//!     ├─► no project root ────── Ok (nothing to install)
//!     │
//!     └─► projects[root] ─► InstallQueue::run(resolve + restore)
//!                                 │
//!                                 └─► ContentStore populated
//! ```
//!
//! The project cache only grows: a root keeps its queue for the lifetime of
//! the materializer, and failed installs are simply retried on next access.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{FsError, FsResult};
use crate::install::{read_install_options, InstallEngine, ProjectFs};
use crate::queue::InstallQueue;
use crate::uri::{MappedUri, Uri};

/// Drives the install engine so that requested paths exist in the store.
pub struct Materializer {
    config: Arc<Config>,
    engine: Arc<dyn InstallEngine>,
    project_fs: Arc<dyn ProjectFs>,
    projects: Mutex<FxHashMap<String, Arc<InstallQueue>>>,
}

impl Materializer {
    /// Create a materializer with an empty project cache.
    pub fn new(
        config: Arc<Config>,
        engine: Arc<dyn InstallEngine>,
        project_fs: Arc<dyn ProjectFs>,
    ) -> Self {
        Self {
            config,
            engine,
            project_fs,
            projects: Mutex::new(FxHashMap::default()),
        }
    }

    /// Decode a virtual URI and make sure its packages are installed.
    pub fn ensure_contents(&self, uri: &Uri) -> FsResult<()> {
        self.ensure_mapped(&MappedUri::decode(uri)?)
    }

    /// Make sure the packages behind an already decoded URI are installed.
    ///
    /// Returns once the install queued by *this* call has finished.
    pub fn ensure_mapped(&self, uri: &MappedUri) -> FsResult<()> {
        let path = uri.path();

        if !path.contains(self.config.dependency_dir.as_str()) {
            return Err(FsError::not_found(path));
        }

        // Standard library typings are served elsewhere.
        if self.config.is_reserved(path) {
            return Err(FsError::not_found(path));
        }

        let Some(root) = self.project_root(path) else {
            return Ok(());
        };
        debug!(path, root, "ensuring package contents");

        let queue = self.queue_for(root);
        let options = read_install_options(&*self.project_fs, uri.original(), root, &self.config);

        queue.run(|| {
            let result = self
                .engine
                .resolve_project(root, &options)
                .and_then(|mut project| project.restore());
            result.map_err(|e| {
                error!(root, path, error = %e, "failed to restore packages");
                FsError::install(root, path, e)
            })
        })
    }

    /// Project root owning `path`: everything before the last
    /// `/<dependency_dir>`. `None` when that prefix is empty or absent.
    pub fn project_root<'a>(&self, path: &'a str) -> Option<&'a str> {
        let marker = format!("/{}", self.config.dependency_dir);
        path.rfind(&marker)
            .map(|idx| &path[..idx])
            .filter(|root| !root.is_empty())
    }

    /// Number of project roots seen so far.
    pub fn project_count(&self) -> usize {
        self.projects.lock().len()
    }

    /// Check whether a project root has a queue.
    pub fn has_project(&self, root: &str) -> bool {
        self.projects.lock().contains_key(root)
    }

    /// Installs queued or running for `root`, zero for an unknown root.
    pub fn pending_installs(&self, root: &str) -> u64 {
        self.projects.lock().get(root).map_or(0, |queue| queue.pending())
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get or create the queue for a root in one locked step.
    fn queue_for(&self, root: &str) -> Arc<InstallQueue> {
        let mut projects = self.projects.lock();
        Arc::clone(projects.entry(root.to_string()).or_default())
    }
}
