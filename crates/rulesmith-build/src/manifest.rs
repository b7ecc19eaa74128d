//! The persisted build manifest.
//!
//! ```json
//! {
//!   "version": 1,
//!   "lastBuild": "2026-01-02T03:04:05Z",
//!   "files": {
//!     ".rules/style.md": { "hash": "sha256:…", "mtimeMs": 1700000000000, "outputs": ["CLAUDE.md"] }
//!   },
//!   "targets": { "claude": ["CLAUDE.md"] },
//!   "contexts": { "docs": ["src/lib.rs"] }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Manifest file name inside the state dir.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Last-seen state of one tracked source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// `sha256:<hex>` content hash.
    pub hash: String,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime_ms: u64,
    /// Project-relative outputs this source contributed to, sorted.
    pub outputs: Vec<String>,
}

/// Source-to-output state carried between builds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version.
    pub version: u32,
    /// Completion time of the build that wrote this manifest.
    pub last_build: Option<DateTime<Utc>>,
    /// Project-relative source path to entry.
    pub files: BTreeMap<String, ManifestEntry>,
    /// Target name to its outputs, sorted.
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<String>>,
    /// Glob-strategy target name to the context files it was compiled
    /// against, in [`context_key`] form.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, Vec<String>>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            last_build: None,
            files: BTreeMap::new(),
            targets: BTreeMap::new(),
            contexts: BTreeMap::new(),
        }
    }
}

/// Order-insensitive form of a context-file list: forward slashes,
/// sorted, without duplicates.
pub fn context_key(files: &[String]) -> Vec<String> {
    let set: BTreeSet<String> = files.iter().map(|f| f.replace('\\', "/")).collect();
    set.into_iter().collect()
}

impl Manifest {
    /// Decode a manifest. Unparsable or incompatible content is `None`.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Self>(bytes) {
            Ok(m) if m.version == MANIFEST_VERSION => Some(m),
            Ok(m) => {
                warn!(version = m.version, expected = MANIFEST_VERSION, "incompatible manifest version");
                None
            }
            Err(e) => {
                warn!(error = %e, "unparsable manifest");
                None
            }
        }
    }

    /// Encode as pretty JSON with a trailing newline.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Outputs recorded for `target`.
    pub fn target_outputs(&self, target: &str) -> &[String] {
        self.targets.get(target).map_or(&[], Vec::as_slice)
    }

    /// Context files `target` was last compiled against, if recorded.
    pub fn target_context(&self, target: &str) -> Option<&[String]> {
        self.contexts.get(target).map(Vec::as_slice)
    }

    /// Every output recorded anywhere.
    pub fn all_outputs(&self) -> BTreeSet<&str> {
        self.targets
            .values()
            .flatten()
            .chain(self.files.values().flat_map(|e| &e.outputs))
            .map(String::as_str)
            .collect()
    }

    /// Same tracked state, ignoring the build timestamp.
    pub fn same_state(&self, other: &Self) -> bool {
        self.version == other.version
            && self.files == other.files
            && self.targets == other.targets
            && self.contexts == other.contexts
    }
}
