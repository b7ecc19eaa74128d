//! Manifest persistence.
//!
//! The orchestrator only sees the [`ManifestStore`] seam, so builds can run
//! against an in-memory manifest in tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{BuildError, Result};
use crate::fs::FileSystemOps;
use crate::manifest::{MANIFEST_FILENAME, Manifest};
use crate::transaction::write_atomic;

/// Load and save the build manifest.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// The stored manifest. Absent, corrupt, or incompatible is `None`.
    async fn load(&self) -> Result<Option<Manifest>>;
    /// Replace the stored manifest.
    async fn save(&self, manifest: &Manifest) -> Result<()>;
}

/// Manifest at `state_dir/manifest.json`, written atomically.
pub struct FileManifestStore {
    path: PathBuf,
    fs: Arc<dyn FileSystemOps>,
}

impl FileManifestStore {
    /// Store rooted at `state_dir`.
    pub fn new(state_dir: &Path, fs: Arc<dyn FileSystemOps>) -> Self {
        Self {
            path: state_dir.join(MANIFEST_FILENAME),
            fs,
        }
    }

    /// Manifest file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ManifestStore for FileManifestStore {
    async fn load(&self) -> Result<Option<Manifest>> {
        match self.fs.read_file(&self.path).await {
            Ok(bytes) => Ok(Manifest::decode(&bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no manifest");
                Ok(None)
            }
            Err(e) => Err(BuildError::io(&self.path, e)),
        }
    }

    async fn save(&self, manifest: &Manifest) -> Result<()> {
        let bytes = manifest.encode().map_err(|source| BuildError::Encode {
            what: "manifest",
            source,
        })?;
        write_atomic(Arc::clone(&self.fs), &self.path, &bytes).await?;
        debug!(path = %self.path.display(), files = manifest.files.len(), "saved manifest");
        Ok(())
    }
}

/// In-memory manifest.
#[derive(Default)]
pub struct MemoryManifestStore {
    slot: Mutex<Option<Manifest>>,
}

impl MemoryManifestStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `manifest`.
    pub fn with_manifest(manifest: Manifest) -> Self {
        Self {
            slot: Mutex::new(Some(manifest)),
        }
    }

    /// Copy of the stored manifest.
    pub fn snapshot(&self) -> Option<Manifest> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ManifestStore for MemoryManifestStore {
    async fn load(&self) -> Result<Option<Manifest>> {
        Ok(self.snapshot())
    }

    async fn save(&self, manifest: &Manifest) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(manifest.clone());
        Ok(())
    }
}
