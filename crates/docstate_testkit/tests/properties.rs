//! End-to-end properties of the derived-state layer.

use docstate_core::{
    ActivityEntry, Category, Config, CoreError, DocumentId, KnowledgeBaseId, UserId,
};
use docstate_store::{FileStore, KeyValueStore, ManualClock};
use docstate_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const U: UserId = UserId::new(1);
const TWO_HOURS: Duration = Duration::from_secs(2 * 60 * 60);
const SEVEN_DAYS: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn entry(doc: DocumentId) -> ActivityEntry {
    ActivityEntry::new(doc, format!("Doc {doc}"), TEST_KB, "Test KB")
}

fn ids(t: &TestState, category: Category, start: usize, count: usize) -> Vec<i64> {
    t.activity()
        .fetch(U, category, start, count)
        .unwrap()
        .into_iter()
        .map(|d| d.doc_id)
        .collect()
}

// ---------------------------------------------------------------------------
// Activity ranking
// ---------------------------------------------------------------------------

#[test]
fn bounded_cardinality_keeps_fifty_highest() {
    let t = TestState::memory();
    for i in 1..=75 {
        let doc = t.add_document(i);
        t.activity().record(U, Category::View, &entry(doc), 1_000 + i).unwrap();
    }

    assert_eq!(t.activity().len(U, Category::View).unwrap(), 50);
    let fetched = ids(&t, Category::View, 0, 100);
    let expected: Vec<i64> = (26..=75).rev().collect();
    assert_eq!(fetched, expected);
}

#[test]
fn idempotent_re_record_updates_score() {
    let t = TestState::memory();
    let doc = t.add_document(7);
    t.activity().record(U, Category::Edit, &entry(doc), 100).unwrap();
    t.activity().record(U, Category::Edit, &entry(doc), 250).unwrap();

    assert_eq!(t.activity().len(U, Category::Edit).unwrap(), 1);
    let page = t.activity().fetch(U, Category::Edit, 0, 10).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].timestamp, 250);
}

#[test]
fn re_record_with_older_timestamp_moves_score_back() {
    let t = TestState::memory();
    let doc = t.add_document(7);
    t.activity().record(U, Category::View, &entry(doc), 500).unwrap();
    t.activity().record(U, Category::View, &entry(doc), 400).unwrap();
    assert_eq!(t.activity().fetch(U, Category::View, 0, 1).unwrap()[0].timestamp, 400);
}

#[test]
fn renamed_document_is_a_new_member() {
    let t = TestState::memory();
    let doc = t.add_document(7);
    t.activity().record(U, Category::View, &entry(doc), 100).unwrap();
    let renamed = ActivityEntry::new(doc, "Renamed", TEST_KB, "Test KB");
    t.activity().record(U, Category::View, &renamed, 200).unwrap();

    // Member identity is the full tuple, so both rows are kept.
    assert_eq!(t.activity().len(U, Category::View).unwrap(), 2);
}

#[test]
fn tombstone_on_delete() {
    let t = TestState::memory();
    for i in 1..=4 {
        let doc = t.add_document(i);
        t.activity().record(U, Category::Comment, &entry(doc), i).unwrap();
    }
    t.delete_document(DocumentId::new(3));

    assert_eq!(ids(&t, Category::Comment, 0, 10), vec![4, 2, 1]);
    assert_eq!(t.activity().len(U, Category::Comment).unwrap(), 3);
    // Does not resurface.
    assert_eq!(ids(&t, Category::Comment, 0, 10), vec![4, 2, 1]);
    assert_eq!(t.activity().len(U, Category::Comment).unwrap(), 3);
}

#[test]
fn tombstones_do_not_consume_requested_count() {
    let t = TestState::memory();
    for i in 1..=10 {
        let doc = t.add_document(i);
        t.activity().record(U, Category::View, &entry(doc), i).unwrap();
    }
    for i in [10, 8, 7] {
        t.delete_document(DocumentId::new(i));
    }
    assert_eq!(ids(&t, Category::View, 0, 4), vec![9, 6, 5, 4]);
}

#[test]
fn concrete_view_scenario() {
    let t = TestState::memory();
    let a = t.add_document(1);
    let b = t.add_document(2);

    t.activity().record(U, Category::View, &entry(a), 100).unwrap();
    t.activity().record(U, Category::View, &entry(b), 200).unwrap();
    t.activity().record(U, Category::View, &entry(a), 300).unwrap();

    let page = t.activity().fetch(U, Category::View, 0, 2).unwrap();
    let got: Vec<(i64, i64)> = page.iter().map(|d| (d.doc_id, d.timestamp)).collect();
    assert_eq!(got, vec![(1, 300), (2, 200)]);
    assert_eq!(t.activity().len(U, Category::View).unwrap(), 2);
}

#[test]
fn ties_break_by_member_bytes_descending() {
    let t = TestState::memory();
    let a = t.add_document_titled(1, "alpha");
    let b = t.add_document_titled(2, "beta");
    let ea = ActivityEntry::new(a, "alpha", TEST_KB, "Test KB");
    let eb = ActivityEntry::new(b, "beta", TEST_KB, "Test KB");
    t.activity().record(U, Category::View, &ea, 100).unwrap();
    t.activity().record(U, Category::View, &eb, 100).unwrap();

    // `{"doc_id":2,...` sorts after `{"doc_id":1,...`; reverse order puts it first.
    assert_eq!(ids(&t, Category::View, 0, 2), vec![2, 1]);
}

#[test]
fn malformed_member_written_by_another_writer_is_skipped() {
    let t = TestState::memory();
    let doc = t.add_document(1);
    t.activity().record(U, Category::View, &entry(doc), 10).unwrap();
    t.store
        .zadd(&docstate_core::keys::activity_key(Category::View, U), "oops", 20.0)
        .unwrap();

    assert_eq!(ids(&t, Category::View, 0, 10), vec![1]);
}

#[test]
fn sweep_clears_stale_entries_beyond_fetch_window() {
    let t = TestState::memory();
    for i in 1..=20 {
        let doc = t.add_document(i);
        t.activity().record(U, Category::View, &entry(doc), i).unwrap();
    }
    for i in 1..=5 {
        t.delete_document(DocumentId::new(i));
    }
    // The first page never reaches the oldest entries.
    assert_eq!(ids(&t, Category::View, 0, 3), vec![20, 19, 18]);
    assert_eq!(t.activity().len(U, Category::View).unwrap(), 20);

    let report = t.activity().sweep(U, Category::View).unwrap();
    assert_eq!(report.removed, 5);
    assert_eq!(t.activity().len(U, Category::View).unwrap(), 15);
}

#[test]
fn tombstone_cap_bounds_work_per_fetch() {
    let t = TestState::memory_with(Config::new(TEST_SECRET).with_max_tombstones_per_fetch(Some(4)));
    for i in 1..=12 {
        let doc = t.add_document(i);
        t.activity().record(U, Category::View, &entry(doc), i).unwrap();
    }
    for i in 3..=12 {
        t.delete_document(DocumentId::new(i));
    }

    assert!(ids(&t, Category::View, 0, 2).is_empty());
    assert_eq!(t.activity().len(U, Category::View).unwrap(), 8);
    assert!(ids(&t, Category::View, 0, 2).is_empty());
    assert_eq!(t.activity().len(U, Category::View).unwrap(), 4);
    assert_eq!(ids(&t, Category::View, 0, 2), vec![2, 1]);
    assert_eq!(t.activity().len(U, Category::View).unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[test]
fn token_ttl() {
    let t = TestState::memory();
    let ada = identity(1);
    let token = t.tokens().issue(&ada).unwrap();
    assert_eq!(t.tokens().validate(&token).unwrap(), ada);

    t.advance(TWO_HOURS);
    let err = t.tokens().validate(&token).unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[test]
fn revoke_scope() {
    let t = TestState::memory();
    let ada = identity(1);
    let token = t.tokens().issue(&ada).unwrap();
    t.tokens().revoke(&ada.email).unwrap();
    assert!(t.tokens().validate(&token).unwrap_err().is_unauthorized());
}

#[test]
fn revoke_leaves_displaced_token_until_its_ttl() {
    let t = TestState::memory();
    let ada = identity(1);
    let old = t.tokens().issue(&ada).unwrap();
    t.advance(Duration::from_secs(600));
    let new = t.tokens().issue(&ada).unwrap();
    t.tokens().revoke(&ada.email).unwrap();

    assert!(t.tokens().validate(&new).is_err());
    assert_eq!(t.tokens().validate(&old).unwrap(), ada);
    t.advance(TWO_HOURS - Duration::from_secs(600));
    assert!(t.tokens().validate(&old).unwrap_err().is_not_found());
}

#[test]
fn revoke_twice_reports_not_found() {
    let t = TestState::memory();
    let ada = identity(1);
    t.tokens().issue(&ada).unwrap();
    t.tokens().revoke(&ada.email).unwrap();
    assert!(matches!(
        t.tokens().revoke(&ada.email),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn tokens_from_another_deployment_fail_validation() {
    let a = TestState::memory();
    let b = TestState::memory_with(Config::new("a different secret"));
    let token = a.tokens().issue(&identity(1)).unwrap();
    // Copy the record over so only the signature differs.
    b.store.set_ex(&token, "user1@example.com", TWO_HOURS).unwrap();

    let err = b.tokens().validate(&token).unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailure { .. }));
    assert!(err.is_unauthorized());
}

// ---------------------------------------------------------------------------
// Fingerprints
// ---------------------------------------------------------------------------

#[test]
fn fingerprint_round_trip() {
    let t = TestState::memory();
    let doc = DocumentId::new(99);
    t.fingerprints().set(doc, "abc123").unwrap();
    assert_eq!(t.fingerprints().get(doc).unwrap(), "abc123");

    t.advance(SEVEN_DAYS);
    assert!(t.fingerprints().get(doc).unwrap_err().is_not_found());
}

#[test]
fn edit_refreshes_fingerprint() {
    let t = TestState::memory();
    let doc = t.add_document(1);
    let first = t.events().document_created(doc, b"v1").unwrap();
    t.advance(SEVEN_DAYS - Duration::from_secs(1));
    let second = t.events().document_edited(U, doc, b"v2").unwrap();
    assert_ne!(first, second);

    t.advance(Duration::from_secs(1));
    assert_eq!(t.fingerprints().get(doc).unwrap(), second);
}

// ---------------------------------------------------------------------------
// Persistence and lifecycle
// ---------------------------------------------------------------------------

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let clock = Arc::new(ManualClock::at_secs(TEST_EPOCH_SECS));
    let catalog = Arc::new(docstate_core::InMemoryCatalog::new());
    catalog.insert(docstate_core::DocumentMeta {
        id: DocumentId::new(1),
        title: "Doc".into(),
        knowledge_base_id: KnowledgeBaseId::new(1),
    });

    let token = {
        let store = Arc::new(FileStore::open_with_clock(&path, clock.clone()).unwrap());
        let state = docstate_core::DerivedState::open_with_clock(
            Config::new(TEST_SECRET),
            store,
            catalog.clone(),
            clock.clone(),
        )
        .unwrap();
        state.events().comment_posted(U, DocumentId::new(1)).unwrap();
        let token = state.tokens().issue(&identity(1)).unwrap();
        state.shutdown().unwrap();
        token
    };

    let store = Arc::new(FileStore::open_with_clock(&path, clock.clone()).unwrap());
    let state = docstate_core::DerivedState::open_with_clock(
        Config::new(TEST_SECRET),
        store,
        catalog,
        clock,
    )
    .unwrap();
    assert_eq!(state.tokens().validate(&token).unwrap(), identity(1));
    assert_eq!(state.activity().len(U, Category::Comment).unwrap(), 1);
}

#[test]
fn shutdown_surfaces_store_unavailable() {
    let t = TestState::memory();
    t.shutdown().unwrap();
    let err = t.tokens().issue(&identity(1)).unwrap_err();
    assert!(matches!(err, CoreError::StoreUnavailable(_)));
    assert!(err.is_server_error());
}

// ---------------------------------------------------------------------------
// Randomised
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn random_records_match_model(ops in record_sequence_strategy(80, 1, 200)) {
        let t = TestState::memory();
        for id in 1..=80 {
            t.add_document(id);
        }

        // Actions arrive in time order, one per second.
        let mut model: HashMap<i64, i64> = HashMap::new();
        for (i, op) in ops.iter().enumerate() {
            let doc = DocumentId::new(op.document);
            let ts = 1_000 + i as i64;
            t.activity().record(U, Category::View, &entry(doc), ts).unwrap();
            model.insert(op.document, ts);
        }

        let fetched = t.activity().fetch(U, Category::View, 0, 100).unwrap();
        prop_assert_eq!(fetched.len(), model.len().min(50));
        for pair in fetched.windows(2) {
            prop_assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        for doc in &fetched {
            prop_assert_eq!(model.get(&doc.doc_id).copied(), Some(doc.timestamp));
        }
        if model.len() > 50 {
            // Every evicted document scored no higher than the lowest kept one.
            let lowest_kept = fetched.last().map(|d| d.timestamp).unwrap_or(i64::MIN);
            let kept: std::collections::HashSet<i64> = fetched.iter().map(|d| d.doc_id).collect();
            for (doc, ts) in &model {
                if !kept.contains(doc) {
                    prop_assert!(*ts < lowest_kept);
                }
            }
        }
    }

    #[test]
    fn random_deletions_never_surface(
        ops in record_sequence_strategy(30, 1, 60),
        deleted in prop::collection::hash_set(1i64..=30, 0..15),
        category in category_strategy(),
    ) {
        let t = TestState::memory_with(
            Config::new(TEST_SECRET).with_max_tombstones_per_fetch(None),
        );
        for id in 1..=30 {
            t.add_document(id);
        }
        for op in &ops {
            let doc = DocumentId::new(op.document);
            t.activity().record(U, category, &entry(doc), op.timestamp).unwrap();
        }
        for id in &deleted {
            t.delete_document(DocumentId::new(*id));
        }

        let live: std::collections::HashSet<i64> =
            ops.iter().map(|op| op.document).filter(|d| !deleted.contains(d)).collect();

        let fetched = t.activity().fetch(U, category, 0, 100).unwrap();
        prop_assert_eq!(fetched.len(), live.len());
        for doc in &fetched {
            prop_assert!(!deleted.contains(&doc.doc_id));
        }
        prop_assert_eq!(t.activity().len(U, category).unwrap(), live.len());
    }
}
