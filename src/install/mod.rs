//! Boundary to the package install engine.
//!
//! The engine is a black box: given a project root and the manifest and
//! lockfile texts found there, it resolves the dependency set and restores
//! it into the content store (normally through a [`StoreHost`]).
//!
//! [`StoreHost`]: crate::store::StoreHost

mod options;

pub use options::{read_install_options, DiskFs, ProjectFs};

use crate::error::BoxError;

/// Manifest and lockfile texts read from a project root.
///
/// Each field is `None` when the file does not exist or cannot be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// `package.json` content.
    pub manifest: Option<String>,
    /// `package-lock.kdl` content.
    pub kdl_lock: Option<String>,
    /// `package-lock.json` content.
    pub npm_lock: Option<String>,
}

/// Resolves projects into restorable handles.
pub trait InstallEngine: Send + Sync {
    /// Resolve the dependency set of the project at `root`.
    fn resolve_project(
        &self,
        root: &str,
        options: &InstallOptions,
    ) -> Result<Box<dyn ProjectHandle>, BoxError>;
}

/// A resolved project.
pub trait ProjectHandle: Send {
    /// Fetch and write the project's packages into the content store.
    ///
    /// Must be idempotent: the same project may be restored many times.
    fn restore(&mut self) -> Result<(), BoxError>;
}
