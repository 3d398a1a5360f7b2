//! # docstate Core
//!
//! Derived-state consistency layer for a knowledge-base service.
//!
//! The system of record (identities, knowledge bases, documents) lives in a
//! relational database. Beside it sits a fast key-value store holding state
//! derived from it, kept usefully consistent without cross-store
//! transactions. This crate provides:
//!
//! - [`TokenStore`] - session tokens with a fixed TTL, indexed both ways
//! - [`ActivityRanker`] - bounded per-user recent-activity lists, reconciled
//!   against the system of record when read
//! - [`FingerprintCache`] - short-lived content digests per document
//! - [`DocumentEvents`] - hooks that feed the above from document actions
//! - [`DerivedState`] - the facade owning the shared store client
//!
//! Key names and member encodings are bit-compatible with existing
//! deployments; see [`keys`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod activity;
mod catalog;
mod config;
mod error;
mod fingerprint;
pub mod keys;
mod state;
mod token;
mod types;

pub use activity::{ActivityEntry, ActivityRanker, DocumentEvents, RecentDocument, SweepReport};
pub use catalog::{CatalogError, CatalogResult, DocumentCatalog, DocumentMeta, InMemoryCatalog};
pub use config::{
    Config, DEFAULT_ACTIVITY_CAPACITY, DEFAULT_FINGERPRINT_TTL, DEFAULT_ISSUER,
    DEFAULT_MAX_TOMBSTONES_PER_FETCH, DEFAULT_TOKEN_TTL,
};
pub use error::{CoreError, CoreResult};
pub use fingerprint::{content_hash, FingerprintCache};
pub use state::DerivedState;
pub use token::{AuthConfig, Claims, TokenSigner, TokenStore};
pub use types::{Category, DocumentId, Identity, KnowledgeBaseId, UserId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
