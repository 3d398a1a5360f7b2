//! The in-process keyspace shared by the memory and file backends.
//!
//! Expired strings are treated as absent by every read and are physically
//! dropped by the next write that touches them (or by `purge_expired`).

use crate::backend::{resolve_rank_window, ScoredMember};
use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Value {
    /// A string with an optional absolute deadline in Unix millis.
    String {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at: Option<u64>,
    },
    /// A ranked set, member to score.
    RankedSet { members: BTreeMap<String, f64> },
}

impl Value {
    fn is_expired(&self, now: u64) -> bool {
        matches!(self, Value::String { expires_at: Some(at), .. } if *at <= now)
    }
}

/// All keys of one store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Keyspace {
    entries: BTreeMap<String, Value>,
}

impl Keyspace {
    fn live(&self, key: &str, now: u64) -> Option<&Value> {
        self.entries.get(key).filter(|v| !v.is_expired(now))
    }

    fn drop_if_expired(&mut self, key: &str, now: u64) {
        if self.entries.get(key).is_some_and(|v| v.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    fn members(&self, key: &str, now: u64) -> StoreResult<Option<&BTreeMap<String, f64>>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Value::RankedSet { members }) => Ok(Some(members)),
            Some(Value::String { .. }) => Err(StoreError::wrong_type(key)),
        }
    }

    fn members_mut(
        &mut self,
        key: &str,
        now: u64,
    ) -> StoreResult<Option<&mut BTreeMap<String, f64>>> {
        self.drop_if_expired(key, now);
        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Value::RankedSet { members }) => Ok(Some(members)),
            Some(Value::String { .. }) => Err(StoreError::wrong_type(key)),
        }
    }

    /// Removes `key` if it is an empty ranked set.
    fn drop_if_empty(&mut self, key: &str) {
        if matches!(self.entries.get(key), Some(Value::RankedSet { members }) if members.is_empty())
        {
            self.entries.remove(key);
        }
    }

    pub(crate) fn get(&self, key: &str, now: u64) -> StoreResult<Option<String>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Value::String { value, .. }) => Ok(Some(value.clone())),
            Some(Value::RankedSet { .. }) => Err(StoreError::wrong_type(key)),
        }
    }

    pub(crate) fn set(&mut self, key: &str, value: &str, expires_at: Option<u64>) {
        self.entries.insert(
            key.to_string(),
            Value::String {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    pub(crate) fn del(&mut self, key: &str, now: u64) -> bool {
        match self.entries.remove(key) {
            Some(value) => !value.is_expired(now),
            None => false,
        }
    }

    pub(crate) fn ttl(&self, key: &str, now: u64) -> Option<Duration> {
        match self.live(key, now) {
            Some(Value::String {
                expires_at: Some(at),
                ..
            }) => Some(Duration::from_millis(at - now)),
            _ => None,
        }
    }

    pub(crate) fn zadd(&mut self, key: &str, member: &str, score: f64, now: u64) -> StoreResult<bool> {
        if !score.is_finite() {
            return Err(StoreError::InvalidArgument(format!(
                "score for {key:?} is not a finite number"
            )));
        }
        if self.members_mut(key, now)?.is_none() {
            self.entries.insert(
                key.to_string(),
                Value::RankedSet {
                    members: BTreeMap::new(),
                },
            );
        }
        let members = self
            .members_mut(key, now)?
            .ok_or_else(|| StoreError::Corrupted(format!("ranked set {key:?} vanished")))?;
        Ok(members.insert(member.to_string(), score).is_none())
    }

    pub(crate) fn zrem(&mut self, key: &str, member: &str, now: u64) -> StoreResult<bool> {
        let removed = match self.members_mut(key, now)? {
            Some(members) => members.remove(member).is_some(),
            None => false,
        };
        self.drop_if_empty(key);
        Ok(removed)
    }

    pub(crate) fn zcard(&self, key: &str, now: u64) -> StoreResult<usize> {
        Ok(self.members(key, now)?.map_or(0, BTreeMap::len))
    }

    pub(crate) fn zscore(&self, key: &str, member: &str, now: u64) -> StoreResult<Option<f64>> {
        Ok(self
            .members(key, now)?
            .and_then(|members| members.get(member).copied()))
    }

    pub(crate) fn zrevrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        now: u64,
    ) -> StoreResult<Vec<ScoredMember>> {
        let Some(members) = self.members(key, now)? else {
            return Ok(Vec::new());
        };
        let mut ordered = ascending(members);
        ordered.reverse();
        let Some(window) = resolve_rank_window(ordered.len(), start, stop) else {
            return Ok(Vec::new());
        };
        Ok(ordered[window]
            .iter()
            .map(|(member, score)| ScoredMember::new(member.as_str(), *score))
            .collect())
    }

    pub(crate) fn zremrangebyrank(
        &mut self,
        key: &str,
        start: i64,
        stop: i64,
        now: u64,
    ) -> StoreResult<usize> {
        let Some(members) = self.members_mut(key, now)? else {
            return Ok(0);
        };
        let doomed: Vec<String> = {
            let ordered = ascending(members);
            match resolve_rank_window(ordered.len(), start, stop) {
                Some(window) => ordered[window]
                    .iter()
                    .map(|(member, _)| (*member).clone())
                    .collect(),
                None => Vec::new(),
            }
        };
        for member in &doomed {
            members.remove(member);
        }
        self.drop_if_empty(key);
        Ok(doomed.len())
    }

    pub(crate) fn purge_expired(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, value| !value.is_expired(now));
        before - self.entries.len()
    }

    pub(crate) fn len(&self, now: u64) -> usize {
        self.entries.values().filter(|v| !v.is_expired(now)).count()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Orders members ascending by score, ties broken by member bytes.
fn ascending(members: &BTreeMap<String, f64>) -> Vec<(&String, f64)> {
    // BTreeMap iteration is already byte-ordered, so a stable sort on score
    // keeps the lexicographic tie-break.
    let mut ordered: Vec<(&String, f64)> = members.iter().map(|(m, s)| (m, *s)).collect();
    ordered.sort_by(|a, b| a.1.total_cmp(&b.1));
    ordered
}
