//! Error types for the package filesystem.

use thiserror::Error;

/// Boxed error produced by collaborators (install engines, drop controllers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type FsResult<T> = Result<T, FsError>;

/// Error type for provider, store and materialization failures.
///
/// # Example
///
/// ```ignore
/// match fs.read_file(&uri) {
///     Ok(bytes) => { /* success */ }
///     Err(FsError::NotFound(path)) => eprintln!("missing: {path}"),
///     Err(FsError::Install { root, .. }) => eprintln!("restore failed in {root}"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum FsError {
    /// The virtual URI path does not encode a nested address.
    #[error("invalid path: {path}")]
    MalformedPath {
        /// The offending path.
        path: String,
    },

    /// No entry exists, or the path is not served by this provider.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Target already exists and overwrite was not requested.
    #[error("file exists: {0}")]
    FileExists(String),

    /// Expected a file, found a directory.
    #[error("file is a directory: {0}")]
    IsDirectory(String),

    /// Expected a directory, found a file.
    #[error("file is not a directory: {0}")]
    NotADirectory(String),

    /// Mutation attempted on the read-only package view.
    #[error("{operation} is not supported on the package view")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The install engine failed to resolve or restore a project.
    #[error("failed to restore packages in {root} (requested {path}): {source}")]
    Install {
        /// Project root the install ran for.
        root: String,
        /// Path whose access triggered the install.
        path: String,
        /// Error reported by the install engine.
        #[source]
        source: BoxError,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// Create a not-found error for a path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an install failure.
    pub fn install(root: impl Into<String>, path: impl Into<String>, source: BoxError) -> Self {
        Self::Install {
            root: root.into(),
            path: path.into(),
            source,
        }
    }

    /// Check whether this is a "not found" condition.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
