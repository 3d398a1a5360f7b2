//! Opt-in retry wrapper for transient store failures.

use crate::backend::{KeyValueStore, ScoredMember};
use crate::error::StoreResult;
use std::time::Duration;

/// Backoff policy for [`RetryingStore`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per command, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after every failed retry.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a policy with `max_attempts` and default delays.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay to wait before attempt number `attempt` (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Wraps a store and retries commands that fail with a transient error.
///
/// Every command in the [`KeyValueStore`] set is idempotent with respect to
/// its final state, so replaying one after a dropped reply is safe; the
/// boolean/count results of a replayed write may however describe the replay
/// rather than the first attempt.
///
/// Non-transient errors (wrong type, closed store, invalid argument) are
/// returned immediately.
#[derive(Debug)]
pub struct RetryingStore<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: KeyValueStore> RetryingStore<S> {
    /// Wraps `inner` with the given policy.
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn run<T>(&self, command: &str, mut op: impl FnMut(&S) -> StoreResult<T>) -> StoreResult<T> {
        let mut attempt = 0;
        loop {
            match op(&self.inner) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt + 1 < self.config.max_attempts => {
                    attempt += 1;
                    let delay = self.config.delay_for_attempt(attempt);
                    tracing::debug!(command, attempt, ?delay, error = %err, "retrying store command");
                    std::thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<S: KeyValueStore> KeyValueStore for RetryingStore<S> {
    fn ping(&self) -> StoreResult<()> {
        self.run("PING", |s| s.ping())
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.run("GET", |s| s.get(key))
    }

    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        self.run("SET", |s| s.set_ex(key, value, ttl))
    }

    fn del(&self, key: &str) -> StoreResult<bool> {
        self.run("DEL", |s| s.del(key))
    }

    fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        self.run("PTTL", |s| s.ttl(key))
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
        self.run("ZADD", |s| s.zadd(key, member, score))
    }

    fn zrem(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.run("ZREM", |s| s.zrem(key, member))
    }

    fn zcard(&self, key: &str) -> StoreResult<usize> {
        self.run("ZCARD", |s| s.zcard(key))
    }

    fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        self.run("ZSCORE", |s| s.zscore(key, member))
    }

    fn zrevrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<ScoredMember>> {
        self.run("ZREVRANGE", |s| s.zrevrange_with_scores(key, start, stop))
    }

    fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> StoreResult<usize> {
        self.run("ZREMRANGEBYRANK", |s| s.zremrangebyrank(key, start, stop))
    }

    fn close(&self) -> StoreResult<()> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::InMemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` pings with a connection error.
    struct Flaky {
        inner: InMemoryStore,
        failures: AtomicU32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                inner: InMemoryStore::new(),
                failures: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
            }
        }

        fn trip(&self) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Connection("connection reset".into()));
            }
            Ok(())
        }
    }

    impl KeyValueStore for Flaky {
        fn ping(&self) -> StoreResult<()> {
            self.trip()?;
            self.inner.ping()
        }
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.trip()?;
            self.inner.get(key)
        }
        fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
            self.inner.set_ex(key, value, ttl)
        }
        fn del(&self, key: &str) -> StoreResult<bool> {
            self.inner.del(key)
        }
        fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
            self.inner.ttl(key)
        }
        fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
            self.inner.zadd(key, member, score)
        }
        fn zrem(&self, key: &str, member: &str) -> StoreResult<bool> {
            self.inner.zrem(key, member)
        }
        fn zcard(&self, key: &str) -> StoreResult<usize> {
            self.inner.zcard(key)
        }
        fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
            self.inner.zscore(key, member)
        }
        fn zrevrange_with_scores(
            &self,
            key: &str,
            start: i64,
            stop: i64,
        ) -> StoreResult<Vec<ScoredMember>> {
            self.inner.zrevrange_with_scores(key, start, stop)
        }
        fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> StoreResult<usize> {
            self.inner.zremrangebyrank(key, start, stop)
        }
        fn close(&self) -> StoreResult<()> {
            self.inner.close()
        }
    }

    fn fast(attempts: u32) -> RetryConfig {
        RetryConfig::new(attempts).with_initial_delay(Duration::from_millis(1))
    }

    #[test]
    fn retries_transient_failures() {
        let store = RetryingStore::new(Flaky::new(2), fast(3));
        assert!(store.ping().is_ok());
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let store = RetryingStore::new(Flaky::new(5), fast(2));
        assert!(matches!(store.get("k"), Err(StoreError::Connection(_))));
        assert_eq!(store.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_retry_on_closed() {
        let store = RetryingStore::new(InMemoryStore::new(), fast(5));
        store.close().unwrap();
        assert!(matches!(store.ping(), Err(StoreError::Closed)));
    }

    #[test]
    fn delay_grows_and_caps() {
        let config = RetryConfig::new(10)
            .with_initial_delay(Duration::from_millis(125))
            .with_max_delay(Duration::from_millis(375))
            .with_backoff_multiplier(2.0);
        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(125));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(250));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(375));
    }

    #[test]
    fn no_retry_policy_is_single_attempt() {
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
        assert_eq!(RetryConfig::new(0).max_attempts, 1);
    }
}
