//! Decoding of wrapped virtual URIs.

use super::{path, Uri};
use crate::error::{FsError, FsResult};

/// Authority segment that stands for "no authority" in a wrapped path.
pub const NUL_AUTHORITY: &str = "ts-nul-authority";

/// A virtual URI split into the real address it wraps and its store address.
///
/// Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedUri {
    raw: Uri,
    original: Uri,
    mapped: Uri,
}

impl MappedUri {
    /// Decode `/<scheme>/<authority>[/<rest>]` out of the URI path.
    ///
    /// Fails with [`FsError::MalformedPath`] when the path has fewer than two
    /// segments, or when a separator after the authority is not followed by
    /// a non-empty rest.
    pub fn decode(uri: &Uri) -> FsResult<Self> {
        let (scheme, authority, rest) =
            split_wrapped(uri.path()).ok_or_else(|| FsError::MalformedPath {
                path: uri.path().to_string(),
            })?;

        let authority = if authority == NUL_AUTHORITY { "" } else { authority };
        let real_path = rest.map(|rest| format!("/{rest}")).unwrap_or_default();

        let original = Uri::new(scheme, authority, real_path);
        let mapped = original
            .with_scheme(uri.scheme())
            .with_authority(uri.authority());

        Ok(Self {
            raw: uri.clone(),
            original,
            mapped,
        })
    }

    /// Wrap a real URI into the virtual space of `scheme://authority`.
    ///
    /// An empty real authority is written as [`NUL_AUTHORITY`]. The root
    /// path `/` is written as no rest at all and decodes to an empty path.
    pub fn encode(real: &Uri, scheme: &str, authority: &str) -> Uri {
        let inner_authority = if real.authority().is_empty() {
            NUL_AUTHORITY
        } else {
            real.authority()
        };
        let rest = match real.path() {
            "" | "/" => String::new(),
            path if path.starts_with('/') => path.to_string(),
            path => format!("/{path}"),
        };
        Uri::new(
            scheme,
            authority,
            format!("/{}/{}{}", real.scheme(), inner_authority, rest),
        )
    }

    /// The URI as received.
    pub fn raw(&self) -> &Uri {
        &self.raw
    }

    /// The real address the virtual URI wraps.
    pub fn original(&self) -> &Uri {
        &self.original
    }

    /// The real path re-homed under the outer scheme and authority.
    pub fn mapped(&self) -> &Uri {
        &self.mapped
    }

    /// Path of the mapped address.
    pub fn path(&self) -> &str {
        self.mapped.path()
    }

    /// Scheme of the mapped address.
    pub fn scheme(&self) -> &str {
        self.mapped.scheme()
    }

    /// Authority of the mapped address.
    pub fn authority(&self) -> &str {
        self.mapped.authority()
    }

    /// `/<scheme>/<authority>/<path>`, normalized.
    pub fn flat_path(&self) -> String {
        path::join(["/", self.scheme(), self.authority(), self.path()])
    }
}

/// Split a wrapped path into scheme, authority and optional rest.
fn split_wrapped(path: &str) -> Option<(&str, &str, Option<&str>)> {
    let body = path.strip_prefix('/')?;
    let (scheme, after) = body.split_once('/')?;
    if scheme.is_empty() {
        return None;
    }

    match after.split_once('/') {
        None => Some((scheme, after, None)),
        Some((authority, rest)) if is_valid_rest(rest) => Some((scheme, authority, Some(rest))),
        Some(_) => None,
    }
}

/// The rest must be non-empty and free of line terminators.
fn is_valid_rest(rest: &str) -> bool {
    !rest.is_empty()
        && !rest
            .chars()
            .any(|c| matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}'))
}
