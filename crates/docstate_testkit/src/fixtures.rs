//! Test fixtures and derived-state helpers.
//!
//! Provides a ready-to-use [`DerivedState`] over an in-memory (or temporary
//! file) store, a mutable catalog, and a manual clock shared by both.

use docstate_core::{
    Config, DerivedState, DocumentId, DocumentMeta, Identity, InMemoryCatalog, KnowledgeBaseId,
    UserId,
};
use docstate_store::{FileStore, InMemoryStore, KeyValueStore, ManualClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Secret used by every fixture.
pub const TEST_SECRET: &str = "testkit-secret-key-32-bytes-long";

/// Start time of every fixture clock (2023-11-14T22:13:20Z).
pub const TEST_EPOCH_SECS: u64 = 1_700_000_000;

/// Knowledge base every fixture document belongs to unless stated otherwise.
pub const TEST_KB: KnowledgeBaseId = KnowledgeBaseId::new(1);

/// A derived-state handle with its collaborators exposed.
pub struct TestState {
    /// The handle under test.
    pub state: DerivedState,
    /// The store behind it.
    pub store: Arc<dyn KeyValueStore>,
    /// The system of record stand-in.
    pub catalog: Arc<InMemoryCatalog>,
    /// The clock driving token times, activity scores and expiry.
    pub clock: Arc<ManualClock>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestState {
    /// Creates a state over a fresh in-memory store with default settings.
    pub fn memory() -> Self {
        Self::memory_with(Config::new(TEST_SECRET))
    }

    /// Creates a state over a fresh in-memory store.
    pub fn memory_with(config: Config) -> Self {
        let clock = Arc::new(ManualClock::at_secs(TEST_EPOCH_SECS));
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::with_clock(clock.clone()));
        Self::build(config, store, clock, None)
    }

    /// Creates a state over a snapshot file in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clock = Arc::new(ManualClock::at_secs(TEST_EPOCH_SECS));
        let store: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::open_with_clock(&temp_dir.path().join("state.json"), clock.clone())
                .expect("Failed to open file store"),
        );
        Self::build(Config::new(TEST_SECRET), store, clock, Some(temp_dir))
    }

    fn build(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<ManualClock>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_knowledge_base(TEST_KB, "Test KB");
        let state = DerivedState::open_with_clock(
            config,
            Arc::clone(&store),
            catalog.clone(),
            clock.clone(),
        )
        .expect("Failed to open derived state");

        Self {
            state,
            store,
            catalog,
            clock,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the snapshot path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().join("state.json"))
    }

    /// Adds a document titled `Doc <id>` to [`TEST_KB`].
    pub fn add_document(&self, id: i64) -> DocumentId {
        self.add_document_titled(id, &format!("Doc {id}"))
    }

    /// Adds a document with the given title to [`TEST_KB`].
    pub fn add_document_titled(&self, id: i64, title: &str) -> DocumentId {
        let id = DocumentId::new(id);
        self.catalog.insert(DocumentMeta {
            id,
            title: title.to_string(),
            knowledge_base_id: TEST_KB,
        });
        id
    }

    /// Deletes a document from the system of record.
    pub fn delete_document(&self, id: DocumentId) {
        self.catalog.remove(id);
    }

    /// Moves the shared clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Moves the shared clock to `secs` past the Unix epoch.
    pub fn set_time(&self, secs: u64) {
        self.clock.set_millis(secs * 1000);
    }
}

impl std::ops::Deref for TestState {
    type Target = DerivedState;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

/// Builds the identity `user<n>@example.com` with user ID `n`.
pub fn identity(n: i64) -> Identity {
    Identity::new(UserId::new(n), format!("user{n}@example.com"))
}

/// Runs a test with a temporary in-memory state.
///
/// # Example
///
/// ```rust,ignore
/// use docstate_testkit::with_test_state;
///
/// #[test]
/// fn my_test() {
///     with_test_state(|t| {
///         let doc = t.add_document(1);
///         // ... test operations
///     });
/// }
/// ```
pub fn with_test_state<F, R>(f: F) -> R
where
    F: FnOnce(&TestState) -> R,
{
    let test_state = TestState::memory();
    f(&test_state)
}

/// Runs a test with a temporary file-backed state.
pub fn with_file_state<F, R>(f: F) -> R
where
    F: FnOnce(&TestState) -> R,
{
    let test_state = TestState::file();
    f(&test_state)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a state where `user` viewed documents `1..=count`, document `i`
    /// at `TEST_EPOCH_SECS + i`.
    pub fn viewed_documents(user: UserId, count: i64) -> TestState {
        let t = TestState::memory_with(Config::new(TEST_SECRET).with_max_tombstones_per_fetch(None));
        for i in 1..=count {
            let doc = t.add_document(i);
            t.set_time(TEST_EPOCH_SECS + i as u64);
            t.events()
                .document_viewed(user, doc, format!("body {i}").as_bytes())
                .expect("Failed to record view");
        }
        t
    }
}
