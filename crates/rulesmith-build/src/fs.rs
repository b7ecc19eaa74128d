//! Filesystem seam.
//!
//! Every byte the orchestrator reads or writes goes through
//! [`FileSystemOps`], so tests can inject failures at any step.

use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// What the build needs to know about a file on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileStat {
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime_ms: u64,
    /// Size in bytes.
    pub len: u64,
}

/// Filesystem operations used by the build.
#[async_trait]
pub trait FileSystemOps: Send + Sync {
    /// Read a file.
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Create or truncate a file, write `content`, and flush it to disk.
    async fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()>;
    /// Create a file that must not exist yet (`AlreadyExists` otherwise).
    async fn create_new(&self, path: &Path, content: &[u8]) -> io::Result<()>;
    /// Atomically replace `to` with `from`.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Delete a file.
    async fn remove_file(&self, path: &Path) -> io::Result<()>;
    /// Stat a file; `None` when it does not exist.
    async fn stat(&self, path: &Path) -> io::Result<Option<FileStat>>;
    /// Create a directory and all parent directories.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    /// File names directly inside `dir`; empty when `dir` does not exist.
    async fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem operations backed by `tokio::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RealFileSystem;

#[async_trait]
impl FileSystemOps for RealFileSystem {
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(content).await?;
        file.sync_all().await
    }

    async fn create_new(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(content).await?;
        file.sync_all().await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await?;
        if let Some(parent) = to.parent() {
            // Persist the rename itself; not every platform can open a dir.
            if let Ok(dir) = tokio::fs::File::open(parent).await {
                let _ = dir.sync_all().await;
            }
        }
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn stat(&self, path: &Path) -> io::Result<Option<FileStat>> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => {
                let mtime_ms = meta
                    .modified()?
                    .duration_since(UNIX_EPOCH)
                    .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
                    .unwrap_or(0);
                Ok(Some(FileStat {
                    mtime_ms,
                    len: meta.len(),
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            out.push(entry.path());
        }
        out.sort();
        Ok(out)
    }
}
