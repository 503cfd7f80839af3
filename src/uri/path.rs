//! POSIX-style path utilities for URI paths.
//!
//! URI paths always use `/` regardless of the host platform, so these helpers
//! work on `&str` instead of `std::path::Path`.

/// Normalize a `/`-separated path.
///
/// Collapses repeated separators, drops `.` segments and resolves `..`
/// (never above the root for absolute paths). A trailing separator is kept.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let absolute = path.starts_with('/');
    let trailing = path.len() > 1 && path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut out = String::with_capacity(path.len());
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if out.is_empty() {
        out.push('.');
    }
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// Join path parts with `/` and normalize the result.
///
/// Empty parts are skipped.
pub fn join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = parts
        .into_iter()
        .filter(|part| !part.as_ref().is_empty())
        .fold(String::new(), |mut acc, part| {
            if !acc.is_empty() {
                acc.push('/');
            }
            acc.push_str(part.as_ref());
            acc
        });
    normalize(&joined)
}

/// Last segment of a path, ignoring trailing separators.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
