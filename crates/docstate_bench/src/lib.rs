//! Benchmark utilities.

use docstate_core::{
    Category, Config, DerivedState, DocumentId, DocumentMeta, InMemoryCatalog, KnowledgeBaseId,
    UserId,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

/// User whose lists the benchmarks fill.
pub const BENCH_USER: UserId = UserId::new(1);

/// Generate a random alphanumeric title of `len` characters.
pub fn random_title(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate random body bytes of the specified size.
pub fn random_body(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// A catalog holding documents `1..=count` in one knowledge base.
pub fn catalog_with(count: i64) -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.insert_knowledge_base(KnowledgeBaseId::new(1), "Bench");
    for id in 1..=count {
        catalog.insert(DocumentMeta {
            id: DocumentId::new(id),
            title: random_title(24),
            knowledge_base_id: KnowledgeBaseId::new(1),
        });
    }
    catalog
}

/// An in-memory state whose catalog holds documents `1..=documents`.
pub fn state_with(documents: i64) -> (DerivedState, Arc<InMemoryCatalog>) {
    let catalog = catalog_with(documents);
    let config = Config::new("bench-secret").with_max_tombstones_per_fetch(None);
    let state = DerivedState::open_in_memory(config, Arc::clone(&catalog) as _)
        .unwrap_or_else(|e| panic!("failed to open bench state: {e}"));
    (state, catalog)
}

/// Fills the view list of [`BENCH_USER`] with documents `1..=count`.
pub fn fill_views(state: &DerivedState, count: i64) {
    for id in 1..=count {
        state
            .events()
            .record(BENCH_USER, Category::View, DocumentId::new(id))
            .unwrap_or_else(|e| panic!("failed to record view: {e}"));
    }
}
