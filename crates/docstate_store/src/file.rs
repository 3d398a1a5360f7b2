//! Snapshot-persisted key-value store.

use crate::backend::{KeyValueStore, ScoredMember};
use crate::clock::{deadline_after, Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::keyspace::Keyspace;
use parking_lot::RwLock;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A key-value store persisted as a JSON snapshot file.
///
/// The whole keyspace lives in memory; every mutating command rewrites the
/// snapshot before returning. Expiry deadlines are stored as absolute Unix
/// milliseconds, so a key set with a two-hour TTL is still gone two hours
/// later even if the process restarted in between.
///
/// # Durability
///
/// Snapshots are written to a sibling temporary file, synced, and renamed
/// over the previous snapshot, so a crash leaves either the old or the new
/// snapshot on disk, never a torn one.
///
/// # Example
///
/// ```no_run
/// use docstate_store::{FileStore, KeyValueStore};
/// use std::path::Path;
/// use std::time::Duration;
///
/// let store = FileStore::open(Path::new("docstate.json")).unwrap();
/// store.set_ex("k", "v", Duration::from_secs(60)).unwrap();
/// ```
pub struct FileStore {
    path: PathBuf,
    keyspace: RwLock<Keyspace>,
    clock: Arc<dyn Clock>,
    closed: AtomicBool,
}

impl FileStore {
    /// Opens the snapshot at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Opens the snapshot at `path` using `clock` for expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open_with_clock(path: &Path, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let keyspace = match fs::read(path) {
            Ok(bytes) if bytes.is_empty() => Keyspace::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Keyspace::default(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), "opened snapshot store");
        Ok(Self {
            path: path.to_path_buf(),
            keyspace: RwLock::new(keyspace),
            clock,
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drops every expired key and rewrites the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn purge_expired(&self) -> StoreResult<usize> {
        let now = self.ensure_open()?;
        self.mutate(|ks| Ok(ks.purge_expired(now)))
    }

    fn ensure_open(&self) -> StoreResult<u64> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(self.clock.now_millis())
    }

    /// Applies `f` under the write lock and persists the result.
    fn mutate<T>(&self, f: impl FnOnce(&mut Keyspace) -> StoreResult<T>) -> StoreResult<T> {
        let mut keyspace = self.keyspace.write();
        let result = f(&mut keyspace)?;
        persist(&self.path, &keyspace)?;
        Ok(result)
    }
}

fn persist(path: &Path, keyspace: &Keyspace) -> StoreResult<()> {
    let bytes = serde_json::to_vec(keyspace)?;
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl KeyValueStore for FileStore {
    fn ping(&self) -> StoreResult<()> {
        self.ensure_open().map(|_| ())
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.ensure_open()?;
        self.keyspace.read().get(key, now)
    }

    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let now = self.ensure_open()?;
        self.mutate(|ks| {
            ks.set(key, value, Some(deadline_after(now, ttl)));
            Ok(())
        })
    }

    fn del(&self, key: &str) -> StoreResult<bool> {
        let now = self.ensure_open()?;
        self.mutate(|ks| Ok(ks.del(key, now)))
    }

    fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let now = self.ensure_open()?;
        Ok(self.keyspace.read().ttl(key, now))
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
        let now = self.ensure_open()?;
        self.mutate(|ks| ks.zadd(key, member, score, now))
    }

    fn zrem(&self, key: &str, member: &str) -> StoreResult<bool> {
        let now = self.ensure_open()?;
        self.mutate(|ks| ks.zrem(key, member, now))
    }

    fn zcard(&self, key: &str) -> StoreResult<usize> {
        let now = self.ensure_open()?;
        self.keyspace.read().zcard(key, now)
    }

    fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        let now = self.ensure_open()?;
        self.keyspace.read().zscore(key, member, now)
    }

    fn zrevrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<ScoredMember>> {
        let now = self.ensure_open()?;
        self.keyspace.read().zrevrange(key, start, stop, now)
    }

    fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> StoreResult<usize> {
        let now = self.ensure_open()?;
        self.mutate(|ks| ks.zremrangebyrank(key, start, stop, now))
    }

    fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        persist(&self.path, &self.keyspace.read())
    }
}
