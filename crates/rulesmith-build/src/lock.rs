//! Cooperative cross-process build lock.
//!
//! At most one live lock exists per project. A lock older than the staleness
//! window is treated as abandoned and reclaimed; there is no heartbeat, so a
//! crashed build is only recovered this way.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{BuildError, Result};
use crate::fs::FileSystemOps;

/// Lock file name inside the state dir.
pub const LOCK_FILENAME: &str = "build.lock";

/// Default staleness window.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Who holds the lock, and since when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Holder process id.
    pub pid: u32,
    /// Holder host name.
    pub host: String,
    /// Acquisition time.
    pub acquired_at: DateTime<Utc>,
}

impl LockRecord {
    /// A record for the current process, acquired now.
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            host: host_name(),
            acquired_at: Utc::now(),
        }
    }

    /// Age at `now`; zero if the record is from the future.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.acquired_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the lock is older than `stale_after` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.age(now) > stale_after
    }
}

/// Best-effort host name from the environment.
pub fn host_name() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "localhost".to_string())
}

/// Outcome of a successful acquisition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockAcquisition {
    /// The stale lock that was removed to make room, if any.
    pub reclaimed: Option<LockRecord>,
}

/// Storage for the build lock.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Take the lock for `record`, reclaiming a lock older than `stale_after`.
    ///
    /// Fails with [`BuildError::LockConflict`] when a fresh lock exists.
    async fn acquire(&self, record: &LockRecord, stale_after: Duration) -> Result<LockAcquisition>;
    /// Drop the lock if it is still held by `owner`.
    ///
    /// Returns `false`, leaving the lock in place, when another holder has
    /// since reclaimed it.
    async fn release(&self, owner: &LockRecord) -> Result<bool>;
    /// Current holder, if any.
    async fn holder(&self) -> Result<Option<LockRecord>>;
    /// Remove the lock regardless of holder. Returns the removed record.
    async fn force_unlock(&self) -> Result<Option<LockRecord>>;
}

/// Lock stored as a JSON file created with `create_new`.
pub struct FileLockStore {
    path: PathBuf,
    fs: Arc<dyn FileSystemOps>,
}

impl FileLockStore {
    /// Lock at `state_dir/build.lock`.
    pub fn new(state_dir: &Path, fs: Arc<dyn FileSystemOps>) -> Self {
        Self {
            path: state_dir.join(LOCK_FILENAME),
            fs,
        }
    }

    /// Lock file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn try_create(&self, record: &LockRecord) -> Result<bool> {
        let bytes = serde_json::to_vec_pretty(record).map_err(|source| BuildError::Encode {
            what: "build lock",
            source,
        })?;
        match self.fs.create_new(&self.path, &bytes).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(BuildError::io(&self.path, e)),
        }
    }

    /// Read the existing lock. An unreadable record is dated by the file's
    /// mtime so that a half-written lock still ages out.
    async fn read_existing(&self) -> Result<Option<LockRecord>> {
        let bytes = match self.fs.read_file(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BuildError::io(&self.path, e)),
        };
        if let Ok(record) = serde_json::from_slice::<LockRecord>(&bytes) {
            return Ok(Some(record));
        }
        warn!(path = %self.path.display(), "unreadable build lock");
        let stat = self
            .fs
            .stat(&self.path)
            .await
            .map_err(|e| BuildError::io(&self.path, e))?;
        let acquired_at = stat
            .and_then(|s| i64::try_from(s.mtime_ms).ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);
        Ok(Some(LockRecord {
            pid: 0,
            host: "unknown".into(),
            acquired_at,
        }))
    }

    async fn remove(&self) -> Result<()> {
        match self.fs.remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BuildError::io(&self.path, e)),
        }
    }
}

#[async_trait]
impl LockStore for FileLockStore {
    async fn acquire(&self, record: &LockRecord, stale_after: Duration) -> Result<LockAcquisition> {
        if let Some(parent) = self.path.parent() {
            self.fs
                .create_dir_all(parent)
                .await
                .map_err(|e| BuildError::io(parent, e))?;
        }
        if self.try_create(record).await? {
            info!(path = %self.path.display(), pid = record.pid, "build lock acquired");
            return Ok(LockAcquisition { reclaimed: None });
        }

        let Some(existing) = self.read_existing().await? else {
            // Released between our attempt and the read.
            return if self.try_create(record).await? {
                Ok(LockAcquisition { reclaimed: None })
            } else {
                Err(self.conflict(record.clone()))
            };
        };

        if !existing.is_stale(Utc::now(), stale_after) {
            warn!(
                path = %self.path.display(),
                holder_pid = existing.pid,
                holder_host = %existing.host,
                "build lock conflict"
            );
            return Err(self.conflict(existing));
        }

        warn!(
            path = %self.path.display(),
            holder_pid = existing.pid,
            acquired_at = %existing.acquired_at,
            "reclaiming stale build lock"
        );
        self.remove().await?;
        if self.try_create(record).await? {
            Ok(LockAcquisition {
                reclaimed: Some(existing),
            })
        } else {
            // Another process reclaimed it first.
            let holder = self.read_existing().await?.unwrap_or(existing);
            Err(self.conflict(holder))
        }
    }

    async fn release(&self, owner: &LockRecord) -> Result<bool> {
        match self.read_existing().await? {
            Some(holder) if holder == *owner => {
                self.remove().await?;
                info!(path = %self.path.display(), "build lock released");
                Ok(true)
            }
            Some(holder) => {
                warn!(
                    path = %self.path.display(),
                    holder_pid = holder.pid,
                    holder_host = %holder.host,
                    "build lock was reclaimed by another holder, leaving it"
                );
                Ok(false)
            }
            None => {
                warn!(path = %self.path.display(), "build lock already gone at release");
                Ok(false)
            }
        }
    }

    async fn holder(&self) -> Result<Option<LockRecord>> {
        self.read_existing().await
    }

    async fn force_unlock(&self) -> Result<Option<LockRecord>> {
        let existing = self.read_existing().await?;
        self.remove().await?;
        if existing.is_some() {
            warn!(path = %self.path.display(), "build lock force-removed");
        }
        Ok(existing)
    }
}

impl FileLockStore {
    fn conflict(&self, holder: LockRecord) -> BuildError {
        BuildError::LockConflict {
            path: self.path.clone(),
            holder,
        }
    }
}

/// In-memory lock for tests and embedding.
#[derive(Clone, Default)]
pub struct MemoryLockStore {
    slot: Arc<Mutex<Option<LockRecord>>>,
}

impl MemoryLockStore {
    /// An unlocked store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `record`.
    pub fn held_by(record: LockRecord) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(record))),
        }
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Option<LockRecord>) -> T) -> T {
        let mut guard = self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn acquire(&self, record: &LockRecord, stale_after: Duration) -> Result<LockAcquisition> {
        self.with_slot(|slot| match slot.take() {
            None => {
                *slot = Some(record.clone());
                Ok(LockAcquisition { reclaimed: None })
            }
            Some(existing) if existing.is_stale(Utc::now(), stale_after) => {
                *slot = Some(record.clone());
                Ok(LockAcquisition {
                    reclaimed: Some(existing),
                })
            }
            Some(existing) => {
                *slot = Some(existing.clone());
                Err(BuildError::LockConflict {
                    path: PathBuf::from("<memory>"),
                    holder: existing,
                })
            }
        })
    }

    async fn release(&self, owner: &LockRecord) -> Result<bool> {
        let released = self.with_slot(|slot| {
            if slot.as_ref() == Some(owner) {
                *slot = None;
                true
            } else {
                false
            }
        });
        if !released {
            warn!("in-memory build lock not held by this owner, leaving it");
        }
        Ok(released)
    }

    async fn holder(&self) -> Result<Option<LockRecord>> {
        Ok(self.with_slot(|slot| slot.clone()))
    }

    async fn force_unlock(&self) -> Result<Option<LockRecord>> {
        Ok(self.with_slot(Option::take))
    }
}
