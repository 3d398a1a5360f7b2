//! Content fingerprint cache.
//!
//! Stores a short-lived digest per document so a caller can later tell
//! whether a body it already holds is still current. Comparing digests is the
//! caller's business; this cache only stores and retrieves them.

use crate::error::{CoreError, CoreResult};
use crate::keys::fingerprint_key;
use crate::types::DocumentId;
use docstate_store::KeyValueStore;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// Lowercase hex SHA-256 of a document body.
#[must_use]
pub fn content_hash(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        // Writing into a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Per-document fingerprint records with a fixed TTL.
#[derive(Clone)]
pub struct FingerprintCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl FingerprintCache {
    /// Creates a cache writing through `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Stores `hash` for `document`, replacing any previous value and
    /// restarting the TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the write fails.
    pub fn set(&self, document: DocumentId, hash: &str) -> CoreResult<()> {
        self.store.set_ex(&fingerprint_key(document), hash, self.ttl)?;
        Ok(())
    }

    /// Returns the stored hash for `document`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if absent or expired and
    /// [`CoreError::StoreUnavailable`] if the read fails.
    pub fn get(&self, document: DocumentId) -> CoreResult<String> {
        self.store
            .get(&fingerprint_key(document))?
            .ok_or_else(|| CoreError::not_found(format!("fingerprint for document {document}")))
    }

    /// Hashes `body` and stores the digest, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the write fails.
    pub fn record_body(&self, document: DocumentId, body: &[u8]) -> CoreResult<String> {
        let hash = content_hash(body);
        self.set(document, &hash)?;
        Ok(hash)
    }

    /// Configured lifetime of a fingerprint.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for FingerprintCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintCache").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstate_store::{InMemoryStore, ManualClock};

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn cache() -> (FingerprintCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_secs(1_700_000_000));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        (FingerprintCache::new(store, WEEK), clock)
    }

    #[test]
    fn hash_of_empty_body() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_of_known_body() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn set_then_get() {
        let (cache, _) = cache();
        cache.set(DocumentId::new(1), "abc123").unwrap();
        assert_eq!(cache.get(DocumentId::new(1)).unwrap(), "abc123");
    }

    #[test]
    fn overwrite_replaces_value() {
        let (cache, _) = cache();
        cache.set(DocumentId::new(1), "old").unwrap();
        cache.set(DocumentId::new(1), "new").unwrap();
        assert_eq!(cache.get(DocumentId::new(1)).unwrap(), "new");
    }

    #[test]
    fn missing_is_not_found() {
        let (cache, _) = cache();
        assert!(cache.get(DocumentId::new(404)).unwrap_err().is_not_found());
    }

    #[test]
    fn expires_after_ttl() {
        let (cache, clock) = cache();
        cache.set(DocumentId::new(1), "abc123").unwrap();
        clock.advance(WEEK - Duration::from_secs(1));
        assert!(cache.get(DocumentId::new(1)).is_ok());
        clock.advance(Duration::from_secs(1));
        assert!(cache.get(DocumentId::new(1)).unwrap_err().is_not_found());
    }

    #[test]
    fn record_body_stores_digest() {
        let (cache, _) = cache();
        let hash = cache.record_body(DocumentId::new(5), b"abc").unwrap();
        assert_eq!(cache.get(DocumentId::new(5)).unwrap(), hash);
    }
}
