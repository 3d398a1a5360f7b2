//! Bounded recent-activity lists with read-time reconciliation.
//!
//! Each (user, category) pair owns one ranked set scored by action time. A
//! record upserts the entry and trims the set back to capacity. A fetch walks
//! the set from the newest entry and drops entries whose document no longer
//! exists in the system of record.
//!
//! None of the multi-command sequences here are atomic. A trim racing a
//! concurrent insert can leave the set briefly over capacity; the next record
//! trims it again.

use super::entry::{ActivityEntry, RecentDocument};
use crate::catalog::DocumentCatalog;
use crate::error::CoreResult;
use crate::keys::activity_key;
use crate::types::{Category, UserId};
use docstate_store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a full reconciliation pass over one list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Members examined.
    pub scanned: usize,
    /// Members removed because their document is gone.
    pub removed: usize,
    /// Members that could not be decoded (left in place).
    pub malformed: usize,
}

enum Verdict {
    Keep(RecentDocument),
    Stale,
    Skip,
}

/// Maintains per-user recent-activity lists.
#[derive(Clone)]
pub struct ActivityRanker {
    store: Arc<dyn KeyValueStore>,
    catalog: Arc<dyn DocumentCatalog>,
    capacity: usize,
    max_tombstones_per_fetch: Option<usize>,
}

impl ActivityRanker {
    /// Creates a ranker.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn DocumentCatalog>,
        capacity: usize,
        max_tombstones_per_fetch: Option<usize>,
    ) -> Self {
        Self {
            store,
            catalog,
            capacity: capacity.max(1),
            max_tombstones_per_fetch,
        }
    }

    /// Records `entry` for `user` under `category` at `timestamp` (Unix
    /// seconds).
    ///
    /// Re-recording an identical entry only moves its score. Afterwards the
    /// list is trimmed to the `capacity` highest-scored entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if a store command fails.
    pub fn record(
        &self,
        user: UserId,
        category: Category,
        entry: &ActivityEntry,
        timestamp: i64,
    ) -> CoreResult<()> {
        let key = activity_key(category, user);
        self.store.zadd(&key, &entry.encode()?, timestamp as f64)?;

        let keep = i64::try_from(self.capacity).unwrap_or(i64::MAX);
        let trimmed = self.store.zremrangebyrank(&key, 0, -keep.saturating_add(1))?;
        if trimmed > 0 {
            debug!(%key, trimmed, "trimmed activity list");
        }
        Ok(())
    }

    /// Returns up to `count` entries starting at rank `start`, newest first.
    ///
    /// Entries whose document is gone are removed from the list and do not
    /// count towards `count`; scanning continues until `count` live entries are
    /// collected, the list is exhausted, or the per-fetch tombstone cap is hit.
    /// Undecodable members and entries whose lookup failed are skipped and left
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if a store command fails.
    pub fn fetch(
        &self,
        user: UserId,
        category: Category,
        start: usize,
        count: usize,
    ) -> CoreResult<Vec<RecentDocument>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let key = activity_key(category, user);
        let mut out = Vec::with_capacity(count.min(self.capacity));
        let mut rank = i64::try_from(start).unwrap_or(i64::MAX);
        let mut tombstones = 0usize;

        while out.len() < count {
            let wanted = (count - out.len()).min(self.capacity);
            let stop = rank.saturating_add(wanted as i64 - 1);
            let window = self.store.zrevrange_with_scores(&key, rank, stop)?;
            let window_len = window.len();
            let mut removed_here = 0usize;

            for scored in window {
                match self.judge(&key, &scored.member, scored.score) {
                    Verdict::Keep(doc) => out.push(doc),
                    Verdict::Skip => {}
                    Verdict::Stale => {
                        self.store.zrem(&key, &scored.member)?;
                        removed_here += 1;
                        tombstones += 1;
                        info!(%key, member = %scored.member, "removed entry for deleted document");

                        if self.max_tombstones_per_fetch.is_some_and(|cap| tombstones >= cap) {
                            debug!(%key, tombstones, "tombstone cap reached, returning partial page");
                            return Ok(out);
                        }
                    }
                }
                if out.len() == count {
                    return Ok(out);
                }
            }

            if window_len < wanted {
                break;
            }
            // Removed members shift everything behind them up by one rank.
            rank = rank.saturating_add((window_len - removed_here) as i64);
        }

        Ok(out)
    }

    /// Reconciles the whole list against the system of record.
    ///
    /// Unlike [`fetch`](Self::fetch) this is not capped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if a store command fails.
    pub fn sweep(&self, user: UserId, category: Category) -> CoreResult<SweepReport> {
        let key = activity_key(category, user);
        let members = self.store.zrevrange_with_scores(&key, 0, -1)?;
        let mut report = SweepReport {
            scanned: members.len(),
            ..SweepReport::default()
        };

        for scored in members {
            let entry = match ActivityEntry::decode(&key, &scored.member) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, member = %scored.member, "sweep skipped malformed entry");
                    report.malformed += 1;
                    continue;
                }
            };
            match self.catalog.document_exists(entry.document_id()) {
                Ok(true) => {}
                Ok(false) => {
                    self.store.zrem(&key, &scored.member)?;
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(%key, doc_id = entry.doc_id, error = %e, "document lookup failed during sweep");
                }
            }
        }

        if report.removed > 0 || report.malformed > 0 {
            info!(%key, removed = report.removed, malformed = report.malformed, "swept activity list");
        }
        Ok(report)
    }

    /// Number of entries stored for `user` under `category`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the store command fails.
    pub fn len(&self, user: UserId, category: Category) -> CoreResult<usize> {
        Ok(self.store.zcard(&activity_key(category, user))?)
    }

    /// Returns true if nothing is stored for `user` under `category`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the store command fails.
    pub fn is_empty(&self, user: UserId, category: Category) -> CoreResult<bool> {
        Ok(self.len(user, category)? == 0)
    }

    /// Configured per-list capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn judge(&self, key: &str, member: &str, score: f64) -> Verdict {
        let entry = match ActivityEntry::decode(key, member) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, %member, "skipping malformed activity entry");
                return Verdict::Skip;
            }
        };
        match self.catalog.document_exists(entry.document_id()) {
            Ok(true) => Verdict::Keep(RecentDocument::from_scored(entry, score)),
            Ok(false) => Verdict::Stale,
            Err(e) => {
                warn!(%key, doc_id = entry.doc_id, error = %e, "document lookup failed, keeping entry");
                Verdict::Skip
            }
        }
    }
}

impl std::fmt::Debug for ActivityRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityRanker")
            .field("capacity", &self.capacity)
            .field("max_tombstones_per_fetch", &self.max_tombstones_per_fetch)
            .finish_non_exhaustive()
    }
}
