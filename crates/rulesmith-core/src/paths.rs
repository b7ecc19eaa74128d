//! Forward-slash relative path helpers.
//!
//! Every path that crosses a crate boundary (manifest keys, rule source
//! paths, project tree entries) is a forward-slash string relative to some
//! root. These helpers keep that representation consistent across platforms.

use std::path::{Component, Path};

/// Render a path with forward slashes, dropping `.` components.
pub fn to_forward_slash(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Path of `path` relative to `root`, forward-slash separated.
///
/// Falls back to the full path when `path` is not under `root`.
pub fn relative_to(path: &Path, root: &Path) -> String {
    to_forward_slash(path.strip_prefix(root).unwrap_or(path))
}

/// Lexically normalise a relative path, resolving `.` and `..`.
///
/// Returns `None` when the path climbs above its root or is absolute, which
/// callers treat as a traversal attempt.
///
/// ```text
/// normalize_relative("a/./b/../c.md") → Some("a/c.md")
/// normalize_relative("../secret")     → None
/// ```
pub fn normalize_relative(path: &str) -> Option<String> {
    if path.starts_with('/') || path.starts_with('\\') || has_drive_prefix(path) {
        return None;
    }
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                let _ = parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Join a relative base directory and a relative path, then normalise.
pub fn join_relative(base_dir: &str, path: &str) -> Option<String> {
    if base_dir.is_empty() {
        normalize_relative(path)
    } else {
        normalize_relative(&format!("{base_dir}/{path}"))
    }
}

/// Parent directory of a forward-slash relative path (`""` at the root).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Check whether `path` equals `dir` or lies beneath it.
///
/// The slash boundary is enforced: `src/api-v2` is not under `src/api`.
/// An empty `dir` contains everything.
pub fn is_within(path: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        return true;
    }
    path == dir || path.starts_with(&format!("{dir}/"))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
