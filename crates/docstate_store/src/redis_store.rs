//! Redis-backed key-value store.

use crate::backend::{KeyValueStore, ScoredMember};
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A store talking to a Redis server over one shared connection.
///
/// The connection is opened lazily and reopened after a transport failure;
/// the failing command itself is not replayed (wrap the store in
/// [`crate::RetryingStore`] for that). Commands are serialized through the
/// connection mutex.
pub struct RedisStore {
    client: redis::Client,
    conn: Mutex<Option<redis::Connection>>,
    closed: AtomicBool,
}

impl RedisStore {
    /// Creates a store for the server at `url` (`redis://host:port/db`).
    ///
    /// No connection is made until the first command.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn open(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(|e| map_error("", e))?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Runs `f` on the shared connection. `key` names the addressed key in
    /// type errors.
    fn with_conn<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    ) -> StoreResult<T> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        let mut guard = self.conn.lock();
        if guard.is_none() {
            *guard = Some(self.client.get_connection().map_err(|e| map_error(key, e))?);
        }
        let conn = guard
            .as_mut()
            .ok_or_else(|| StoreError::Connection("connection unavailable".into()))?;
        match f(conn) {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.is_io_error() || err.is_connection_dropped() {
                    *guard = None;
                }
                Err(map_error(key, err))
            }
        }
    }
}

/// Only transport failures become [`StoreError::Connection`]; server replies
/// and conversion failures are not worth retrying.
fn map_error(key: &str, err: redis::RedisError) -> StoreError {
    if err.code() == Some("WRONGTYPE") {
        return StoreError::wrong_type(key);
    }
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        return StoreError::Connection(err.to_string());
    }
    StoreError::Command(err.to_string())
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl KeyValueStore for RedisStore {
    fn ping(&self) -> StoreResult<()> {
        self.with_conn("", |c| redis::cmd("PING").query::<String>(c).map(|_| ()))
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_conn(key, |c| redis::cmd("GET").arg(key).query(c))
    }

    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        self.with_conn(key, |c| {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("PX")
                .arg(millis)
                .query(c)
        })
    }

    fn del(&self, key: &str) -> StoreResult<bool> {
        self.with_conn(key, |c| redis::cmd("DEL").arg(key).query::<i64>(c))
            .map(|n| n > 0)
    }

    fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let millis: i64 = self.with_conn(key, |c| redis::cmd("PTTL").arg(key).query(c))?;
        // -2: no such key, -1: no expiry
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
        if !score.is_finite() {
            return Err(StoreError::InvalidArgument(format!(
                "score for {key:?} is not a finite number"
            )));
        }
        self.with_conn(key, |c| {
            redis::cmd("ZADD")
                .arg(key)
                .arg(score)
                .arg(member)
                .query::<i64>(c)
        })
        .map(|added| added > 0)
    }

    fn zrem(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.with_conn(key, |c| redis::cmd("ZREM").arg(key).arg(member).query::<i64>(c))
            .map(|n| n > 0)
    }

    fn zcard(&self, key: &str) -> StoreResult<usize> {
        self.with_conn(key, |c| redis::cmd("ZCARD").arg(key).query(c))
    }

    fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        self.with_conn(key, |c| redis::cmd("ZSCORE").arg(key).arg(member).query(c))
    }

    fn zrevrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<ScoredMember>> {
        let pairs: Vec<(String, f64)> = self.with_conn(key, |c| {
            redis::cmd("ZREVRANGE")
                .arg(key)
                .arg(start)
                .arg(stop)
                .arg("WITHSCORES")
                .query(c)
        })?;
        Ok(pairs
            .into_iter()
            .map(|(member, score)| ScoredMember { member, score })
            .collect())
    }

    fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> StoreResult<usize> {
        self.with_conn(key, |c| {
            redis::cmd("ZREMRANGEBYRANK")
                .arg(key)
                .arg(start)
                .arg(stop)
                .query(c)
        })
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        self.conn.lock().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_rejected() {
        assert!(RedisStore::open("not a url").is_err());
    }

    #[test]
    fn transport_failures_are_transient() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = map_error("k", redis::RedisError::from(io));
        assert!(matches!(err, StoreError::Connection(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn server_replies_are_not_transient() {
        let err = map_error(
            "k",
            redis::RedisError::from((redis::ErrorKind::ResponseError, "ERR syntax error")),
        );
        assert!(matches!(err, StoreError::Command(_)));
        assert!(!err.is_transient());

        let err = map_error(
            "k",
            redis::RedisError::from((redis::ErrorKind::TypeError, "response was nil")),
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn wrong_type_names_the_key() {
        let err = map_error(
            "user_recent_view_docs:7",
            redis::make_extension_error(
                "WRONGTYPE".to_string(),
                Some("Operation against a key holding the wrong kind of value".to_string()),
            ),
        );
        assert!(matches!(err, StoreError::WrongType { key } if key == "user_recent_view_docs:7"));
    }

    #[test]
    fn closed_store_does_not_connect() {
        let store = RedisStore::open("redis://127.0.0.1:1/").unwrap();
        store.close().unwrap();
        assert!(matches!(store.ping(), Err(StoreError::Closed)));
    }
}
