//! # docstate Store
//!
//! The key-value client seam for the docstate derived-state layer.
//!
//! This crate provides the lowest-level abstraction: a blocking client for an
//! auxiliary key-value store with string values (optionally expiring) and
//! ranked sets. Stores do not interpret keys or members; the core crate owns
//! the key-naming scheme and the member encoding.
//!
//! ## Design Principles
//!
//! - The command set is a Redis subset with Redis semantics
//! - Every command is atomic on its own; nothing spans several commands
//! - Must be `Send + Sync`: one handle is shared by every worker
//! - Time comes from an injected [`Clock`] so expiry is testable
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For tests and single-process embedding
//! - [`FileStore`] - JSON snapshot persistence for single-node tools
//! - [`RetryingStore`] - Wrapper that retries transient failures
//! - `RedisStore` - Real Redis server (feature `redis`)
//!
//! ## Example
//!
//! ```rust
//! use docstate_store::{InMemoryStore, KeyValueStore};
//!
//! let store = InMemoryStore::new();
//! store.zadd("scores", "alice", 10.0).unwrap();
//! store.zadd("scores", "bob", 20.0).unwrap();
//! let top = store.zrevrange_with_scores("scores", 0, 0).unwrap();
//! assert_eq!(top[0].member, "bob");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod backend;
mod clock;
mod error;
mod file;
mod keyspace;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod retry;

pub use backend::{resolve_rank_window, KeyValueStore, ScoredMember};
pub use clock::{deadline_after, Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use retry::{RetryConfig, RetryingStore};

use std::sync::Arc;

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set_ex(&self, key: &str, value: &str, ttl: std::time::Duration) -> StoreResult<()> {
        (**self).set_ex(key, value, ttl)
    }

    fn del(&self, key: &str) -> StoreResult<bool> {
        (**self).del(key)
    }

    fn ttl(&self, key: &str) -> StoreResult<Option<std::time::Duration>> {
        (**self).ttl(key)
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
        (**self).zadd(key, member, score)
    }

    fn zrem(&self, key: &str, member: &str) -> StoreResult<bool> {
        (**self).zrem(key, member)
    }

    fn zcard(&self, key: &str) -> StoreResult<usize> {
        (**self).zcard(key)
    }

    fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        (**self).zscore(key, member)
    }

    fn zrevrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<ScoredMember>> {
        (**self).zrevrange_with_scores(key, start, stop)
    }

    fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> StoreResult<usize> {
        (**self).zremrangebyrank(key, start, stop)
    }

    fn close(&self) -> StoreResult<()> {
        (**self).close()
    }
}
