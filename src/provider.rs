//! Read-only filesystem provider over lazily installed packages.
//!
//! Every read first materializes the requested path, then answers from the
//! content store at the mapped real path. Mutations are rejected: the real
//! project files are the only place packages can be changed.

use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use crate::config::{self, Config};
use crate::error::{FsError, FsResult};
use crate::event::{Disposable, Emitter, Listener};
use crate::install::{DiskFs, InstallEngine, ProjectFs};
use crate::materialize::Materializer;
use crate::store::{ContentStore, FileChange, FileStat, FileType, WriteOptions};
use crate::uri::{path, MappedUri, Uri};

// =============================================================================
// AutoInstallFs
// =============================================================================

/// Filesystem provider that makes dependency trees appear installed.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use autoinstall_fs::prelude::*;
///
/// let store = Arc::new(MemStore::new());
/// let engine = Arc::new(MyEngine::new(StoreHost::new(store.clone())));
/// let fs = AutoInstallFs::builder(store, engine).build();
///
/// let uri = Uri::parse("memfs://auth/file/ts-nul-authority/proj/node_modules/left-pad/index.js")?;
/// let bytes = fs.read_file(&uri)?;
/// ```
pub struct AutoInstallFs {
    config: Arc<Config>,
    store: Arc<dyn ContentStore>,
    materializer: Materializer,
    emitter: Arc<Emitter<[FileChange]>>,
    _store_events: Disposable,
}

impl AutoInstallFs {
    /// Start building a provider over `store`, installing through `engine`.
    pub fn builder(
        store: Arc<dyn ContentStore>,
        engine: Arc<dyn InstallEngine>,
    ) -> ProviderBuilder {
        ProviderBuilder::new(store, engine)
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Watch the store entry behind a virtual URI.
    pub fn watch(&self, uri: &Uri) -> FsResult<Disposable> {
        let mapped = MappedUri::decode(uri)?;
        let real = Uri::file(mapped.path());
        debug!(uri = %real, "watching");
        Ok(self.store.watch(&real))
    }

    /// Stat a virtual URI.
    ///
    /// Dependency and typings directories always exist, even before any
    /// install has finished.
    pub fn stat(&self, uri: &Uri) -> FsResult<FileStat> {
        let mapped = MappedUri::decode(uri)?;
        if self.config.is_always_present(path::basename(mapped.path())) {
            return Ok(FileStat::synthetic_directory());
        }

        self.materializer.ensure_mapped(&mapped)?;
        self.store.stat(&Uri::file(mapped.path()))
    }

    /// List a virtual directory.
    pub fn read_directory(&self, uri: &Uri) -> FsResult<Vec<(String, FileType)>> {
        let mapped = MappedUri::decode(uri)?;
        self.materializer.ensure_mapped(&mapped)?;
        self.store.read_directory(&Uri::file(mapped.path()))
    }

    /// Read a virtual file.
    pub fn read_file(&self, uri: &Uri) -> FsResult<Vec<u8>> {
        let mapped = MappedUri::decode(uri)?;
        self.materializer.ensure_mapped(&mapped)?;
        self.store.read_file(&Uri::file(mapped.path()))
    }

    /// Materialize many paths in parallel.
    ///
    /// Installs for the same project root still run one after another.
    #[cfg(feature = "batch")]
    pub fn prefetch(&self, uris: &[Uri]) -> Vec<FsResult<()>> {
        use rayon::prelude::*;

        uris.par_iter()
            .map(|uri| self.materializer.ensure_contents(uri))
            .collect()
    }

    // =========================================================================
    // Write Operations (unsupported)
    // =========================================================================

    /// Always fails: the package view is read-only.
    pub fn write_file(&self, _uri: &Uri, _content: &[u8], _options: WriteOptions) -> FsResult<()> {
        Err(FsError::Unsupported { operation: "write_file" })
    }

    /// Always fails: the package view is read-only.
    pub fn rename(&self, _old: &Uri, _new: &Uri, _overwrite: bool) -> FsResult<()> {
        Err(FsError::Unsupported { operation: "rename" })
    }

    /// Always fails: the package view is read-only.
    pub fn delete(&self, _uri: &Uri) -> FsResult<()> {
        Err(FsError::Unsupported { operation: "delete" })
    }

    /// Always fails: the package view is read-only.
    pub fn create_directory(&self, _uri: &Uri) -> FsResult<()> {
        Err(FsError::Unsupported { operation: "create_directory" })
    }

    // =========================================================================
    // Events & Accessors
    // =========================================================================

    /// Subscribe to store changes, re-tagged with the provider scheme.
    pub fn on_did_change(&self, listener: Listener<[FileChange]>) -> Disposable {
        self.emitter.subscribe(listener)
    }

    /// Wrap a real URI into this provider's address space.
    pub fn virtual_uri(&self, real: &Uri, authority: &str) -> Uri {
        MappedUri::encode(real, &self.config.scheme, authority)
    }

    /// The materializer driving installs.
    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

// =============================================================================
// ProviderBuilder
// =============================================================================

/// Builder for [`AutoInstallFs`].
///
/// Use [`AutoInstallFs::builder`] to create one.
pub struct ProviderBuilder {
    store: Arc<dyn ContentStore>,
    engine: Arc<dyn InstallEngine>,
    project_fs: Option<Arc<dyn ProjectFs>>,
    config: Option<Config>,
}

impl ProviderBuilder {
    fn new(store: Arc<dyn ContentStore>, engine: Arc<dyn InstallEngine>) -> Self {
        Self {
            store,
            engine,
            project_fs: None,
            config: None,
        }
    }

    /// Read manifests and lockfiles through `fs` instead of the local disk.
    pub fn project_fs(mut self, fs: Arc<dyn ProjectFs>) -> Self {
        self.project_fs = Some(fs);
        self
    }

    /// Use an explicit configuration instead of the global one.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the provider and start forwarding store events.
    pub fn build(self) -> AutoInstallFs {
        let config = Arc::new(self.config.unwrap_or_else(|| config::get().clone()));
        let project_fs = self.project_fs.unwrap_or_else(|| Arc::new(DiskFs));
        let emitter = Arc::new(Emitter::new());

        let store_events = self.store.on_did_change(forward_events(
            Arc::downgrade(&emitter),
            config.scheme.clone(),
        ));

        AutoInstallFs {
            materializer: Materializer::new(Arc::clone(&config), self.engine, project_fs),
            config,
            store: self.store,
            emitter,
            _store_events: store_events,
        }
    }
}

/// Listener that re-emits store changes under `scheme`.
fn forward_events(emitter: Weak<Emitter<[FileChange]>>, scheme: String) -> Listener<[FileChange]> {
    Arc::new(move |changes: &[FileChange]| {
        let Some(emitter) = emitter.upgrade() else {
            return;
        };
        let retagged: Vec<FileChange> = changes
            .iter()
            .map(|change| FileChange::new(change.kind, change.uri.with_scheme(scheme.as_str())))
            .collect();
        trace!(count = retagged.len(), "forwarding store changes");
        emitter.fire(&retagged);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChangeKind, MemStore, StoreHost};
    use crate::testing::RecordingEngine;
    use parking_lot::Mutex;

    struct Fixture {
        store: Arc<MemStore>,
        workspace: Arc<MemStore>,
        engine: RecordingEngine,
        fs: AutoInstallFs,
    }

    fn fixture(configure: impl FnOnce(RecordingEngine) -> RecordingEngine) -> Fixture {
        let store = Arc::new(MemStore::new());
        let workspace = Arc::new(MemStore::new());
        let engine = configure(RecordingEngine::new(StoreHost::new(store.clone())));
        let fs = AutoInstallFs::builder(store.clone(), Arc::new(engine.clone()))
            .project_fs(workspace.clone())
            .config(Config::default())
            .build();
        Fixture {
            store,
            workspace,
            engine,
            fs,
        }
    }

    fn uri(path: &str) -> Uri {
        Uri::new("memfs", "auth", format!("/file/workspace-auth{path}"))
    }

    #[test]
    fn test_left_pad_scenario() {
        let fx = fixture(|e| e.with_package("left-pad/index.js", "module.exports = leftPad;"));
        fx.workspace.create_directory(&Uri::file("/proj")).unwrap();
        fx.workspace
            .write_file(&Uri::file("/proj/package.json"), b"{}", WriteOptions::upsert())
            .unwrap();

        let target =
            Uri::parse("memfs://auth/file/workspace-auth/proj/node_modules/left-pad/index.js")
                .unwrap();
        let bytes = fx.fs.read_file(&target).unwrap();
        assert_eq!(bytes, b"module.exports = leftPad;");

        let state = fx.engine.state();
        assert_eq!(state.resolves.len(), 1);
        let (root, options) = &state.resolves[0];
        assert_eq!(root, "/proj");
        assert_eq!(options.manifest.as_deref(), Some("{}"));
        assert_eq!(options.kdl_lock, None);
        assert_eq!(options.npm_lock, None);
    }

    #[test]
    fn test_always_present_directories() {
        let fx = fixture(|e| e);
        for path in ["/proj/node_modules", "/proj/node_modules/@types", "/x/node_modules/"] {
            let stat = fx.fs.stat(&uri(path)).unwrap();
            assert_eq!(stat, FileStat::synthetic_directory());
        }
        assert_eq!(fx.engine.resolve_count(), 0);
        assert!(fx.store.is_empty());
    }

    #[test]
    fn test_escaped_scope_is_always_present() {
        let fx = fixture(|e| e);
        let escaped =
            Uri::parse("memfs://auth/file/workspace-auth/proj/node_modules/%40types?x#y").unwrap();
        assert_eq!(fx.fs.stat(&escaped).unwrap(), FileStat::synthetic_directory());
        assert_eq!(fx.engine.resolve_count(), 0);
    }

    #[test]
    fn test_stat_and_read_directory_after_install() {
        let fx = fixture(|e| {
            e.with_package("left-pad/index.js", "1")
                .with_package("left-pad/package.json", "{}")
        });

        let listing = fx.fs.read_directory(&uri("/proj/node_modules/left-pad")).unwrap();
        assert_eq!(
            listing,
            vec![
                ("index.js".to_string(), FileType::File),
                ("package.json".to_string(), FileType::File),
            ]
        );
        let stat = fx.fs.stat(&uri("/proj/node_modules/left-pad/index.js")).unwrap();
        assert_eq!(stat.file_type, FileType::File);
        assert_eq!(stat.size, 1);
    }

    #[test]
    fn test_outside_dependency_dir_is_not_found() {
        let fx = fixture(|e| e);
        assert!(fx.fs.read_file(&uri("/proj/src/index.ts")).unwrap_err().is_not_found());
        assert!(fx.fs.stat(&uri("/proj/src")).unwrap_err().is_not_found());
        assert_eq!(fx.engine.resolve_count(), 0);
    }

    #[test]
    fn test_malformed_uri() {
        let fx = fixture(|e| e);
        let err = fx.fs.read_file(&Uri::new("memfs", "auth", "/file")).unwrap_err();
        assert!(matches!(err, FsError::MalformedPath { .. }));
    }

    #[test]
    fn test_mutations_are_unsupported() {
        let fx = fixture(|e| e);
        let changes = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&changes);
        let _sub = fx.store.on_did_change(Arc::new(move |c: &[FileChange]| {
            *counter.lock() += c.len();
        }));

        let target = uri("/proj/node_modules/x/index.js");
        let results = [
            fx.fs.write_file(&target, b"x", WriteOptions::upsert()),
            fx.fs.rename(&target, &uri("/proj/node_modules/y"), true),
            fx.fs.delete(&target),
            fx.fs.create_directory(&uri("/proj/node_modules/z")),
        ];
        for result in results {
            assert!(matches!(result, Err(FsError::Unsupported { .. })));
        }
        assert!(fx.store.is_empty());
        assert_eq!(*changes.lock(), 0);
        assert_eq!(fx.engine.resolve_count(), 0);
    }

    #[test]
    fn test_events_are_retagged() {
        let fx = fixture(|e| e.with_package("a/index.js", "a"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = fx.fs.on_did_change(Arc::new(move |changes: &[FileChange]| {
            sink.lock().extend(changes.iter().cloned());
        }));

        fx.fs.read_file(&uri("/proj/node_modules/a/index.js")).unwrap();

        let seen = seen.lock();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|c| c.uri.scheme() == "memfs"));
        assert!(seen.iter().any(|c| c.kind == ChangeKind::Created
            && c.uri.path() == "/proj/node_modules/a/index.js"));
    }

    #[test]
    fn test_watch_maps_to_real_path() {
        let fx = fixture(|e| e);
        let handle = fx.fs.watch(&uri("/proj/node_modules/a")).unwrap();
        assert_eq!(fx.store.watch_count(&Uri::file("/proj/node_modules/a")), 1);
        handle.dispose();
        assert_eq!(fx.store.watch_count(&Uri::file("/proj/node_modules/a")), 0);
    }

    #[test]
    fn test_failed_install_recovers_on_next_access() {
        let fx = fixture(|e| e.with_package("a/index.js", "a").failing(1));
        let target = uri("/proj/node_modules/a/index.js");

        assert!(matches!(fx.fs.read_file(&target), Err(FsError::Install { .. })));
        assert_eq!(fx.fs.read_file(&target).unwrap(), b"a");
    }

    #[test]
    fn test_virtual_uri_round_trips() {
        let fx = fixture(|e| e);
        let real = Uri::file("/proj/node_modules/a");
        let wrapped = fx.fs.virtual_uri(&real, "auth");
        assert_eq!(wrapped.scheme(), "memfs");
        assert_eq!(MappedUri::decode(&wrapped).unwrap().original(), &real);
    }

    #[cfg(feature = "batch")]
    #[test]
    fn test_prefetch() {
        let fx = fixture(|e| e.with_package("a/index.js", "a"));
        let uris = vec![
            uri("/p1/node_modules/a"),
            uri("/p2/node_modules/a"),
            uri("/p1/src/main.ts"),
        ];

        let results = fx.fs.prefetch(&uris);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].as_ref().unwrap_err().is_not_found());
        assert_eq!(fx.fs.materializer().project_count(), 2);
        assert_eq!(fx.engine.state().max_in_flight_per_root, 1);
    }
}
