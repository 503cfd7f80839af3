//! Configuration for the package filesystem.
//!
//! Use [`ConfigBuilder`] at application startup to change the virtual scheme,
//! the dependency directory name or the manifest/lockfile names.

use std::sync::OnceLock;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scheme the provider is registered under. Store events are re-tagged
    /// with it before being forwarded.
    pub scheme: String,
    /// Directory name installed packages live under.
    pub dependency_dir: String,
    /// Directory basenames that always stat as empty directories.
    pub always_present_dirs: Vec<String>,
    /// Scoped names under the dependency directory that are served elsewhere
    /// and must never trigger an install.
    pub reserved_prefixes: Vec<String>,
    /// Manifest file name read from the project root.
    pub manifest_file: String,
    /// KDL lockfile name read from the project root.
    pub kdl_lockfile: String,
    /// npm lockfile name read from the project root.
    pub npm_lockfile: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme: "memfs".to_string(),
            dependency_dir: "node_modules".to_string(),
            always_present_dirs: vec!["node_modules".to_string(), "@types".to_string()],
            reserved_prefixes: vec!["@typescript".to_string(), "@types/typescript__".to_string()],
            manifest_file: "package.json".to_string(),
            kdl_lockfile: "package-lock.kdl".to_string(),
            npm_lockfile: "package-lock.json".to_string(),
        }
    }
}

impl Config {
    /// Check whether `path` is under a reserved namespace of the dependency
    /// directory (e.g. `node_modules/@typescript`).
    pub fn is_reserved(&self, path: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| path.contains(&format!("{}/{}", self.dependency_dir, prefix)))
    }

    /// Check whether a basename is one of the always-present directories.
    pub fn is_always_present(&self, name: &str) -> bool {
        self.always_present_dirs.iter().any(|dir| dir == name)
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    scheme: Option<String>,
    dependency_dir: Option<String>,
    always_present_dirs: Option<Vec<String>>,
    reserved_prefixes: Option<Vec<String>>,
    manifest_file: Option<String>,
    kdl_lockfile: Option<String>,
    npm_lockfile: Option<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider scheme.
    ///
    /// Default: `"memfs"`
    ///
    /// # Example
    ///
    /// ```
    /// use autoinstall_fs::config::ConfigBuilder;
    ///
    /// let config = ConfigBuilder::new().scheme("pkgfs").build();
    /// assert_eq!(config.scheme, "pkgfs");
    /// ```
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Set the dependency directory name.
    ///
    /// Default: `"node_modules"`
    pub fn dependency_dir(mut self, dir: impl Into<String>) -> Self {
        self.dependency_dir = Some(dir.into());
        self
    }

    /// Set the directory basenames that always stat as directories.
    pub fn always_present_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_present_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Set the reserved scoped prefixes.
    pub fn reserved_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_prefixes = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    /// Set the manifest file name.
    pub fn manifest_file(mut self, name: impl Into<String>) -> Self {
        self.manifest_file = Some(name.into());
        self
    }

    /// Set the KDL lockfile name.
    pub fn kdl_lockfile(mut self, name: impl Into<String>) -> Self {
        self.kdl_lockfile = Some(name.into());
        self
    }

    /// Set the npm lockfile name.
    pub fn npm_lockfile(mut self, name: impl Into<String>) -> Self {
        self.npm_lockfile = Some(name.into());
        self
    }

    /// Build a configuration without touching the global one.
    pub fn build(self) -> Config {
        let default = Config::default();
        Config {
            scheme: self.scheme.unwrap_or(default.scheme),
            dependency_dir: self.dependency_dir.unwrap_or(default.dependency_dir),
            always_present_dirs: self.always_present_dirs.unwrap_or(default.always_present_dirs),
            reserved_prefixes: self.reserved_prefixes.unwrap_or(default.reserved_prefixes),
            manifest_file: self.manifest_file.unwrap_or(default.manifest_file),
            kdl_lockfile: self.kdl_lockfile.unwrap_or(default.kdl_lockfile),
            npm_lockfile: self.npm_lockfile.unwrap_or(default.npm_lockfile),
        }
    }

    /// Build and initialize the global configuration.
    ///
    /// This can only be called once. Subsequent calls are ignored.
    /// Returns `true` if configuration was set, `false` if already initialized.
    pub fn init(self) -> bool {
        CONFIG.set(self.build()).is_ok()
    }
}

/// Initialize with default configuration.
///
/// This is equivalent to `ConfigBuilder::new().init()`.
pub fn init_default() -> bool {
    ConfigBuilder::new().init()
}

/// Get the current configuration, or default if not initialized.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
