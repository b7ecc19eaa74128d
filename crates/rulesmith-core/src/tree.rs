//! Snapshot of the project's file tree.
//!
//! Link and glob checks run against this value rather than the live
//! filesystem, so the validator stays pure and testable.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{CoreError, Result};
use crate::paths::{parent_dir, relative_to};

/// Files and directories of a project, as forward-slash relative paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectTree {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl ProjectTree {
    /// Walk `root`, skipping any directory whose name is in `exclude_dirs`.
    ///
    /// Symlinks are not followed.
    pub fn scan<S: AsRef<str>>(root: &Path, exclude_dirs: &[S]) -> Result<Self> {
        let mut tree = Self::default();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !exclude_dirs
                        .iter()
                        .any(|d| entry.file_name().to_string_lossy() == d.as_ref())
            });

        for entry in walker {
            let entry = entry.map_err(|source| CoreError::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if entry.depth() == 0 {
                continue;
            }
            let rel = relative_to(entry.path(), root);
            if entry.file_type().is_dir() {
                let _ = tree.dirs.insert(rel);
            } else {
                let _ = tree.files.insert(rel);
            }
        }

        debug!(
            root = %root.display(),
            files = tree.files.len(),
            dirs = tree.dirs.len(),
            "scanned project tree"
        );
        Ok(tree)
    }

    /// Build a tree from file paths; parent directories are derived.
    pub fn from_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tree = Self::default();
        for file in files {
            let file = file.into();
            let mut dir = parent_dir(&file).to_owned();
            while !dir.is_empty() {
                let next = parent_dir(&dir).to_owned();
                let _ = tree.dirs.insert(dir);
                dir = next;
            }
            let _ = tree.files.insert(file);
        }
        tree
    }

    /// Whether `path` is a known file or directory. `""` is the root.
    pub fn contains(&self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        path.is_empty() || self.files.contains(path) || self.dirs.contains(path)
    }

    /// Whether `path` is a known file.
    pub fn is_file(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    /// All files, sorted.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Number of files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
