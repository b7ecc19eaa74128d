//! Staged multi-file writes.
//!
//! Every output is first written to a temp file beside its destination.
//! Only when every temp write succeeds are the temps renamed into place.
//! If any write fails, every temp created so far is removed and no
//! destination is touched.
//!
//! The write phase is all-or-nothing; the rename phase is not. Each rename
//! is atomic on its own, but a rename that fails partway through a commit
//! leaves the destinations renamed before it replaced.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::errors::{BuildError, Result};
use crate::fs::FileSystemOps;

/// Marker embedded in every temp file name.
pub const TEMP_MARKER: &str = ".rulesmith-tmp-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique temp path co-located with `dest`.
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map_or_else(|| "output".into(), |n| n.to_string_lossy().into_owned());
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp = format!(".{name}{TEMP_MARKER}{}-{n}", std::process::id());
    dest.with_file_name(tmp)
}

/// Whether `path` names a temp file left by some transaction.
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().contains(TEMP_MARKER))
}

#[derive(Debug)]
struct Staged {
    temp: PathBuf,
    dest: PathBuf,
}

/// A batch of writes committed together.
pub struct WriteTransaction {
    fs: Arc<dyn FileSystemOps>,
    staged: Vec<Staged>,
}

impl WriteTransaction {
    /// An empty transaction.
    pub fn new(fs: Arc<dyn FileSystemOps>) -> Self {
        Self {
            fs,
            staged: Vec::new(),
        }
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Write `content` to a temp file beside `dest`.
    ///
    /// On failure the whole transaction is rolled back before the error is
    /// returned.
    pub async fn stage(&mut self, dest: &Path, content: &[u8]) -> Result<()> {
        if let Err(err) = self.try_stage(dest, content).await {
            self.rollback().await;
            return Err(err);
        }
        Ok(())
    }

    async fn try_stage(&mut self, dest: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = dest.parent() {
            self.fs
                .create_dir_all(parent)
                .await
                .map_err(|e| BuildError::io(parent, e))?;
        }
        let temp = temp_path_for(dest);
        if let Err(e) = self.fs.write_file(&temp, content).await {
            // A failed write may still have created the file.
            let _ = self.fs.remove_file(&temp).await;
            return Err(BuildError::io(dest, e));
        }
        debug!(dest = %dest.display(), temp = %temp.display(), "staged output");
        self.staged.push(Staged {
            temp,
            dest: dest.to_path_buf(),
        });
        Ok(())
    }

    /// Rename every staged temp into place. Returns the destinations.
    ///
    /// Best effort across files: a rename failure removes the temps not yet
    /// renamed and reports the failing destination, but destinations renamed
    /// before it keep their new content.
    pub async fn commit(mut self) -> Result<Vec<PathBuf>> {
        let staged = std::mem::take(&mut self.staged);
        let mut committed = Vec::with_capacity(staged.len());
        let mut iter = staged.into_iter();
        while let Some(item) = iter.next() {
            if let Err(e) = self.fs.rename(&item.temp, &item.dest).await {
                let _ = self.fs.remove_file(&item.temp).await;
                for rest in iter {
                    let _ = self.fs.remove_file(&rest.temp).await;
                }
                return Err(BuildError::io(&item.dest, e));
            }
            committed.push(item.dest);
        }
        Ok(committed)
    }

    /// Remove every staged temp file. Destinations are never touched.
    pub async fn rollback(&mut self) {
        for item in self.staged.drain(..) {
            if let Err(e) = self.fs.remove_file(&item.temp).await {
                warn!(temp = %item.temp.display(), error = %e, "failed to remove temp file");
            }
        }
    }
}

/// Write a single file atomically.
pub async fn write_atomic(fs: Arc<dyn FileSystemOps>, dest: &Path, content: &[u8]) -> Result<()> {
    let mut tx = WriteTransaction::new(fs);
    tx.stage(dest, content).await?;
    let _ = tx.commit().await?;
    Ok(())
}

/// Remove temp files left in `dirs` by an interrupted run. Returns them.
pub async fn cleanup_stale_temps<'a, I>(fs: &dyn FileSystemOps, dirs: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut removed = Vec::new();
    for dir in dirs {
        let entries = fs.list_dir(dir).await.map_err(|e| BuildError::io(dir, e))?;
        for path in entries.into_iter().filter(|p| is_temp_file(p)) {
            match fs.remove_file(&path).await {
                Ok(()) => {
                    warn!(path = %path.display(), "removed temp file from interrupted build");
                    removed.push(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(BuildError::io(&path, e)),
            }
        }
    }
    Ok(removed)
}
