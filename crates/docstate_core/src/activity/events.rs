//! Document lifecycle hooks.
//!
//! Request handlers in the surrounding service call these after the system of
//! record has accepted an action; they keep the derived lists and fingerprints
//! in step with it.

use super::entry::ActivityEntry;
use super::ranker::ActivityRanker;
use crate::catalog::DocumentCatalog;
use crate::error::{CoreError, CoreResult};
use crate::fingerprint::FingerprintCache;
use crate::types::{Category, DocumentId, UserId};
use docstate_store::Clock;
use std::sync::Arc;

/// Derived-state updates triggered by document actions.
#[derive(Clone)]
pub struct DocumentEvents {
    ranker: ActivityRanker,
    fingerprints: FingerprintCache,
    catalog: Arc<dyn DocumentCatalog>,
    clock: Arc<dyn Clock>,
}

impl DocumentEvents {
    /// Creates the hooks.
    pub fn new(
        ranker: ActivityRanker,
        fingerprints: FingerprintCache,
        catalog: Arc<dyn DocumentCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ranker,
            fingerprints,
            catalog,
            clock,
        }
    }

    /// A document was created with `body`. Returns the stored fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the write fails.
    pub fn document_created(&self, document: DocumentId, body: &[u8]) -> CoreResult<String> {
        self.fingerprints.record_body(document, body)
    }

    /// `user` opened `document` and was served `body`. Returns the stored
    /// fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the document is not in the catalog.
    pub fn document_viewed(
        &self,
        user: UserId,
        document: DocumentId,
        body: &[u8],
    ) -> CoreResult<String> {
        self.record(user, Category::View, document)?;
        self.fingerprints.record_body(document, body)
    }

    /// `user` saved `body` as the new content of `document`. Returns the
    /// stored fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the document is not in the catalog.
    pub fn document_edited(
        &self,
        user: UserId,
        document: DocumentId,
        body: &[u8],
    ) -> CoreResult<String> {
        self.record(user, Category::Edit, document)?;
        self.fingerprints.record_body(document, body)
    }

    /// `user` commented on `document`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the document is not in the catalog.
    pub fn comment_posted(&self, user: UserId, document: DocumentId) -> CoreResult<()> {
        self.record(user, Category::Comment, document)
    }

    /// Records a `category` action by `user` on `document` at the current
    /// time without touching the fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the document is not in the catalog.
    pub fn record(&self, user: UserId, category: Category, document: DocumentId) -> CoreResult<()> {
        let meta = self
            .catalog
            .document(document)?
            .ok_or_else(|| CoreError::not_found(format!("document {document}")))?;
        let kb_name = self
            .catalog
            .knowledge_base_name(meta.knowledge_base_id)?
            .unwrap_or_default();
        let entry = ActivityEntry::from_meta(&meta, kb_name);
        let now = i64::try_from(self.clock.now_secs()).unwrap_or(i64::MAX);
        self.ranker.record(user, category, &entry, now)
    }
}

impl std::fmt::Debug for DocumentEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentEvents")
            .field("ranker", &self.ranker)
            .field("fingerprints", &self.fingerprints)
            .finish_non_exhaustive()
    }
}
