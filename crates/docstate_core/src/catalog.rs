//! Lookups into the system of record.
//!
//! The derived layer never owns documents or knowledge bases. It asks a
//! [`DocumentCatalog`] whether a document still exists and what to call it.

use crate::types::{DocumentId, KnowledgeBaseId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Result type for catalog lookups.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised by a catalog implementation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing system could not be queried.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// A catalog file could not be read.
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A catalog file could not be parsed.
    #[error("invalid catalog data: {0}")]
    Invalid(String),
}

/// Document metadata needed to build an activity entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// The document.
    pub id: DocumentId,
    /// Current title.
    pub title: String,
    /// Owning knowledge base.
    pub knowledge_base_id: KnowledgeBaseId,
}

/// Read-only view of the system of record.
pub trait DocumentCatalog: Send + Sync {
    /// Returns the document's metadata, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself failed.
    fn document(&self, id: DocumentId) -> CatalogResult<Option<DocumentMeta>>;

    /// Returns whether the document exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself failed.
    fn document_exists(&self, id: DocumentId) -> CatalogResult<bool> {
        Ok(self.document(id)?.is_some())
    }

    /// Returns the knowledge base's display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself failed.
    fn knowledge_base_name(&self, id: KnowledgeBaseId) -> CatalogResult<Option<String>>;
}

impl<C: DocumentCatalog + ?Sized> DocumentCatalog for std::sync::Arc<C> {
    fn document(&self, id: DocumentId) -> CatalogResult<Option<DocumentMeta>> {
        (**self).document(id)
    }

    fn document_exists(&self, id: DocumentId) -> CatalogResult<bool> {
        (**self).document_exists(id)
    }

    fn knowledge_base_name(&self, id: KnowledgeBaseId) -> CatalogResult<Option<String>> {
        (**self).knowledge_base_name(id)
    }
}

/// On-disk shape of an [`InMemoryCatalog`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    knowledge_bases: Vec<KnowledgeBaseRow>,
    #[serde(default)]
    documents: Vec<DocumentMeta>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KnowledgeBaseRow {
    id: KnowledgeBaseId,
    name: String,
}

#[derive(Debug, Default)]
struct CatalogTables {
    documents: HashMap<DocumentId, DocumentMeta>,
    knowledge_bases: HashMap<KnowledgeBaseId, String>,
}

/// A mutable in-process catalog.
///
/// Used by tests, the CLI and embedders whose system of record already lives
/// in memory. Thread-safe.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    tables: RwLock<CatalogTables>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from JSON of the form
    /// `{"knowledge_bases": [{"id", "name"}], "documents": [{"id", "title", "knowledge_base_id"}]}`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] if the JSON does not match.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| CatalogError::Invalid(e.to_string()))?;
        let catalog = Self::new();
        for kb in file.knowledge_bases {
            catalog.insert_knowledge_base(kb.id, kb.name);
        }
        for doc in file.documents {
            catalog.insert(doc);
        }
        Ok(catalog)
    }

    /// Loads a catalog from a JSON file. A missing file yields an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) if json.trim().is_empty() => Ok(Self::new()),
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Adds or replaces a document.
    pub fn insert(&self, meta: DocumentMeta) {
        self.tables.write().documents.insert(meta.id, meta);
    }

    /// Removes a document, returning whether it was present.
    pub fn remove(&self, id: DocumentId) -> bool {
        self.tables.write().documents.remove(&id).is_some()
    }

    /// Adds or renames a knowledge base.
    pub fn insert_knowledge_base(&self, id: KnowledgeBaseId, name: impl Into<String>) {
        self.tables.write().knowledge_bases.insert(id, name.into());
    }

    /// Number of documents.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.tables.read().documents.len()
    }
}

impl DocumentCatalog for InMemoryCatalog {
    fn document(&self, id: DocumentId) -> CatalogResult<Option<DocumentMeta>> {
        Ok(self.tables.read().documents.get(&id).cloned())
    }

    fn document_exists(&self, id: DocumentId) -> CatalogResult<bool> {
        Ok(self.tables.read().documents.contains_key(&id))
    }

    fn knowledge_base_name(&self, id: KnowledgeBaseId) -> CatalogResult<Option<String>> {
        Ok(self.tables.read().knowledge_bases.get(&id).cloned())
    }
}
