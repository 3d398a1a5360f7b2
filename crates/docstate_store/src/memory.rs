//! In-memory key-value store.

use crate::backend::{KeyValueStore, ScoredMember};
use crate::clock::{deadline_after, Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::keyspace::Keyspace;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An in-process key-value store.
///
/// This store keeps all data in memory and is suitable for:
/// - Unit and integration tests
/// - Embedding the derived-state layer in a single process
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads. Each command
/// takes the keyspace lock once, so commands are individually atomic but
/// sequences of commands are not.
///
/// # Example
///
/// ```rust
/// use docstate_store::{InMemoryStore, KeyValueStore};
/// use std::time::Duration;
///
/// let store = InMemoryStore::new();
/// store.set_ex("greeting", "hello", Duration::from_secs(60)).unwrap();
/// assert_eq!(store.get("greeting").unwrap().as_deref(), Some("hello"));
/// ```
pub struct InMemoryStore {
    keyspace: RwLock<Keyspace>,
    clock: Arc<dyn Clock>,
    closed: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store driven by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store driven by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            keyspace: RwLock::new(Keyspace::default()),
            clock,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keyspace.read().len(self.clock.now_millis())
    }

    /// Physically drops every expired key, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        self.keyspace.write().purge_expired(now)
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.keyspace.write().clear();
    }

    fn ensure_open(&self) -> StoreResult<u64> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(self.clock.now_millis())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl KeyValueStore for InMemoryStore {
    fn ping(&self) -> StoreResult<()> {
        self.ensure_open().map(|_| ())
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.ensure_open()?;
        self.keyspace.read().get(key, now)
    }

    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let now = self.ensure_open()?;
        self.keyspace
            .write()
            .set(key, value, Some(deadline_after(now, ttl)));
        Ok(())
    }

    fn del(&self, key: &str) -> StoreResult<bool> {
        let now = self.ensure_open()?;
        Ok(self.keyspace.write().del(key, now))
    }

    fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let now = self.ensure_open()?;
        Ok(self.keyspace.read().ttl(key, now))
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
        let now = self.ensure_open()?;
        self.keyspace.write().zadd(key, member, score, now)
    }

    fn zrem(&self, key: &str, member: &str) -> StoreResult<bool> {
        let now = self.ensure_open()?;
        self.keyspace.write().zrem(key, member, now)
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
        self.keyspace.write().zremrangebyrank(key, start, stop, now)
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
