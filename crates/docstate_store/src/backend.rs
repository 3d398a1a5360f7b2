//! Key-value store trait definition.

use crate::error::StoreResult;
use std::time::Duration;

/// A member of a ranked set together with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    /// The member bytes, as stored.
    pub member: String,
    /// The member's score.
    pub score: f64,
}

impl ScoredMember {
    /// Creates a new scored member.
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// A blocking client for an auxiliary key-value store.
///
/// The command set is a subset of Redis and follows Redis semantics, so a
/// deployment can point the same data at a real Redis server or keep it
/// in-process. Two value kinds exist: strings (optionally expiring) and ranked
/// sets (members ordered by score, never expiring).
///
/// # Invariants
///
/// - Every command is individually atomic; no command spans several keys
/// - An expired string key is indistinguishable from an absent one
/// - Ranked-set ordering is ascending by `(score, member bytes)`; reverse
///   ranges walk the same order backwards
/// - Addressing a key with a command for the other value kind fails with
///   [`crate::StoreError::WrongType`]
/// - After [`KeyValueStore::close`] every command fails with
///   [`crate::StoreError::Closed`]
///
/// Implementations must be `Send + Sync`: one handle is shared by every worker.
///
/// # Rank windows
///
/// `start` and `stop` in rank-based commands are inclusive. Negative values
/// count from the end (`-1` is the last element). Windows that fall entirely
/// outside the set are empty.
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For tests and embedding
/// - [`super::FileStore`] - Single-node persistence via snapshots
/// - [`super::RetryingStore`] - Backoff wrapper around any store
pub trait KeyValueStore: Send + Sync {
    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or is closed.
    fn ping(&self) -> StoreResult<()>;

    /// Returns the string stored at `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if `key` holds a ranked set.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` at `key` with the given time-to-live, replacing any
    /// previous value and expiry.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Deletes `key` regardless of its kind.
    ///
    /// Returns true if a live key was removed.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    fn del(&self, key: &str) -> StoreResult<bool>;

    /// Returns the remaining lifetime of `key`.
    ///
    /// `None` means the key is absent or does not expire.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Adds `member` to the ranked set at `key`, or updates its score.
    ///
    /// Returns true if the member was not present before.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if `key` holds a string.
    fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool>;

    /// Removes `member` from the ranked set at `key`.
    ///
    /// Returns true if the member was present.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if `key` holds a string.
    fn zrem(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Returns the number of members in the ranked set at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if `key` holds a string.
    fn zcard(&self, key: &str) -> StoreResult<usize>;

    /// Returns the score of `member` in the ranked set at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if `key` holds a string.
    fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>>;

    /// Returns the members ranked `start..=stop` in descending score order.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if `key` holds a string.
    fn zrevrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<ScoredMember>>;

    /// Removes the members ranked `start..=stop` in ascending score order.
    ///
    /// Returns the number of members removed.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or if `key` holds a string.
    fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> StoreResult<usize>;

    /// Shuts the client down.
    ///
    /// # Errors
    ///
    /// Returns an error if pending state could not be flushed.
    fn close(&self) -> StoreResult<()>;
}

/// Resolves a Redis-style inclusive rank window against a set of `len`
/// elements, returning the half-open index range it covers.
#[must_use]
pub fn resolve_rank_window(len: usize, start: i64, stop: i64) -> Option<std::ops::Range<usize>> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let mut start = if start < 0 { start + len_i } else { start };
    let mut stop = if stop < 0 { stop + len_i } else { stop };
    if start < 0 {
        start = 0;
    }
    if stop >= len_i {
        stop = len_i - 1;
    }
    if len == 0 || start > stop || start >= len_i {
        return None;
    }
    // Both bounds are now within 0..len.
    Some(start as usize..(stop as usize) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_positive_bounds() {
        assert_eq!(resolve_rank_window(5, 0, 2), Some(0..3));
        assert_eq!(resolve_rank_window(5, 3, 10), Some(3..5));
    }

    #[test]
    fn window_negative_bounds() {
        assert_eq!(resolve_rank_window(5, 0, -1), Some(0..5));
        assert_eq!(resolve_rank_window(5, -2, -1), Some(3..5));
        // Trim idiom: keep the top 3 of 5 by removing ranks 0..=-4
        assert_eq!(resolve_rank_window(5, 0, -4), Some(0..2));
    }

    #[test]
    fn window_empty_cases() {
        assert_eq!(resolve_rank_window(0, 0, -1), None);
        assert_eq!(resolve_rank_window(5, 5, 9), None);
        assert_eq!(resolve_rank_window(5, 3, 1), None);
        // Nothing to trim when the set is within capacity
        assert_eq!(resolve_rank_window(3, 0, -4), None);
    }
}
