//! Two-phase change detection against the manifest.
//!
//! Phase one compares modification times. Only files whose mtime moved are
//! hashed in phase two; a matching hash makes the file an mtime-only touch.

use std::collections::BTreeMap;

use rulesmith_core::{SourceKind, TrackedSource};
use serde::Serialize;
use tracing::{debug, trace};

use crate::errors::{BuildError, Result};
use crate::fs::FileSystemOps;
use crate::hash::content_hash;
use crate::manifest::Manifest;

/// Observed state of one source on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceState {
    /// Project-relative path.
    pub path: String,
    /// Role in the build.
    pub kind: SourceKind,
    /// `sha256:<hex>` content hash.
    pub hash: String,
    /// Modification time in milliseconds.
    pub mtime_ms: u64,
}

/// How one source differs from the manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Change {
    /// No manifest entry.
    Added,
    /// Content hash differs.
    Changed,
    /// Recorded but no longer on disk.
    Deleted,
    /// Modification time moved, content identical.
    MtimeOnly,
    /// Neither mtime nor content moved.
    Unchanged,
}

/// Result of comparing tracked sources with a manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Sources with no manifest entry.
    pub added: Vec<String>,
    /// Sources whose content changed.
    pub changed: Vec<String>,
    /// Manifest entries whose file is gone.
    pub deleted: Vec<String>,
    /// Sources that were touched but not edited.
    pub mtime_only: Vec<String>,
    /// Sources untouched since the last build.
    pub unchanged: Vec<String>,
    /// Current state of every source on disk, by path.
    pub current: BTreeMap<String, SourceState>,
}

impl ChangeSet {
    /// Whether any source was added, changed, or deleted.
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.changed.is_empty() && self.deleted.is_empty())
    }

    /// Added, changed, and deleted paths: the roots of invalidation.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.added
            .iter()
            .chain(&self.changed)
            .chain(&self.deleted)
            .map(String::as_str)
    }

    /// Whether `path` was added or its content changed.
    pub fn is_modified(&self, path: &str) -> bool {
        self.added.iter().chain(&self.changed).any(|p| p == path)
    }

    /// Classification of `path`, if it is known at all.
    pub fn change_of(&self, path: &str) -> Option<Change> {
        let lists = [
            (&self.added, Change::Added),
            (&self.changed, Change::Changed),
            (&self.deleted, Change::Deleted),
            (&self.mtime_only, Change::MtimeOnly),
            (&self.unchanged, Change::Unchanged),
        ];
        lists
            .into_iter()
            .find(|(list, _)| list.iter().any(|p| p == path))
            .map(|(_, change)| change)
    }
}

/// Compare `sources` against `manifest`. A missing manifest makes every
/// source new.
pub async fn detect_changes(
    fs: &dyn FileSystemOps,
    sources: &[TrackedSource],
    manifest: Option<&Manifest>,
) -> Result<ChangeSet> {
    let mut set = ChangeSet::default();

    for source in sources {
        let Some(stat) = fs
            .stat(&source.abs_path)
            .await
            .map_err(|e| BuildError::io(&source.abs_path, e))?
        else {
            // Vanished between discovery and now; the deletion pass handles it.
            continue;
        };
        let recorded = manifest.and_then(|m| m.files.get(&source.path));

        let (change, hash) = match recorded {
            Some(entry) if entry.mtime_ms == stat.mtime_ms => (Change::Unchanged, entry.hash.clone()),
            Some(entry) => {
                let hash = hash_file(fs, source).await?;
                if hash == entry.hash {
                    (Change::MtimeOnly, hash)
                } else {
                    (Change::Changed, hash)
                }
            }
            None => (Change::Added, hash_file(fs, source).await?),
        };
        trace!(path = %source.path, ?change, "classified source");

        let list = match change {
            Change::Added => &mut set.added,
            Change::Changed => &mut set.changed,
            Change::MtimeOnly => &mut set.mtime_only,
            Change::Unchanged | Change::Deleted => &mut set.unchanged,
        };
        list.push(source.path.clone());
        let _ = set.current.insert(
            source.path.clone(),
            SourceState {
                path: source.path.clone(),
                kind: source.kind,
                hash,
                mtime_ms: stat.mtime_ms,
            },
        );
    }

    if let Some(manifest) = manifest {
        set.deleted = manifest
            .files
            .keys()
            .filter(|path| !set.current.contains_key(*path))
            .cloned()
            .collect();
    }

    debug!(
        added = set.added.len(),
        changed = set.changed.len(),
        deleted = set.deleted.len(),
        mtime_only = set.mtime_only.len(),
        unchanged = set.unchanged.len(),
        "detected changes"
    );
    Ok(set)
}

async fn hash_file(fs: &dyn FileSystemOps, source: &TrackedSource) -> Result<String> {
    let bytes = fs
        .read_file(&source.abs_path)
        .await
        .map_err(|e| BuildError::io(&source.abs_path, e))?;
    Ok(content_hash(&bytes))
}
