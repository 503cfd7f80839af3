//! URIs and the wrapped virtual addressing scheme.
//!
//! ```text
//! memfs://auth/file/workspace-auth/proj/node_modules/left-pad/index.js
//! └─┬─┘   └┬─┘ └─┬┘ └─────┬──────┘└──────────────┬─────────────────┘
//!  outer  outer inner   inner                 real path
//! scheme  auth  scheme  authority
//! ```
//!
//! [`MappedUri::decode`] splits such an address into the real address it
//! wraps (`file://workspace-auth/proj/...`) and the store address it maps to
//! (`memfs://auth/proj/...`).

mod mapped;
pub mod path;

pub use mapped::{MappedUri, NUL_AUTHORITY};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::error::{FsError, FsResult};

/// Characters escaped when a path is written back out.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Path set plus the separator, which ends an authority.
const AUTHORITY: &AsciiSet = &PATH.add(b'/');

/// A `scheme://authority/path` address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Uri {
    scheme: String,
    authority: String,
    path: String,
}

impl Uri {
    /// Create a URI from its parts.
    pub fn new(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            path: path.into(),
        }
    }

    /// Create a `file` URI with no authority.
    pub fn file(path: impl Into<String>) -> Self {
        Self::new("file", "", path)
    }

    /// Parse `scheme://authority/path`.
    ///
    /// The path keeps its leading `/`; it is empty when the input stops after
    /// the authority. Any `?query` or `#fragment` is dropped, and the
    /// authority and path are percent-decoded.
    pub fn parse(input: &str) -> FsResult<Self> {
        let (scheme, rest) = input.split_once("://").ok_or_else(|| FsError::MalformedPath {
            path: input.to_string(),
        })?;
        if scheme.is_empty() {
            return Err(FsError::MalformedPath {
                path: input.to_string(),
            });
        }
        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let rest = rest.split_once('?').map_or(rest, |(before, _)| before);
        let (authority, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        Ok(Self::new(
            scheme,
            percent_decode_str(authority).decode_utf8_lossy(),
            percent_decode_str(path).decode_utf8_lossy(),
        ))
    }

    /// Scheme component.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Authority component (may be empty).
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path component (may be empty).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Copy with a different scheme.
    pub fn with_scheme(&self, scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            ..self.clone()
        }
    }

    /// Copy with a different authority.
    pub fn with_authority(&self, authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            ..self.clone()
        }
    }

    /// Copy with a different path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}://{}{}",
            self.scheme,
            utf8_percent_encode(&self.authority, AUTHORITY),
            utf8_percent_encode(&self.path, PATH)
        )
    }
}

impl std::str::FromStr for Uri {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
