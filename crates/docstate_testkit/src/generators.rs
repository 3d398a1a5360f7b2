//! Property-based test generators using proptest.
//!
//! Provides strategies for generating activity entries and action sequences
//! that exercise the member encoding and the ranked-set bounds.

use docstate_core::{ActivityEntry, Category, DocumentId, KnowledgeBaseId};
use proptest::prelude::*;

/// Strategy for generating document titles, including characters that need
/// escaping in stored members.
pub fn title_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::string::string_regex("[A-Za-z0-9 ]{1,24}").expect("Invalid regex"),
        1 => prop::string::string_regex("[<>&\"\\\\ a-z]{1,12}").expect("Invalid regex"),
        1 => prop::string::string_regex("[\u{2028}\u{2029}\u{4e00}-\u{4e20}\u{e9}a-z]{1,12}")
            .expect("Invalid regex"),
        1 => any::<String>(),
    ]
}

/// Strategy for generating activity entries.
pub fn entry_strategy() -> impl Strategy<Value = ActivityEntry> {
    (any::<i64>(), title_strategy(), any::<i64>(), title_strategy()).prop_map(
        |(doc, title, kb, kb_name)| {
            ActivityEntry::new(DocumentId::new(doc), title, KnowledgeBaseId::new(kb), kb_name)
        },
    )
}

/// Strategy for generating a category.
pub fn category_strategy() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::View),
        Just(Category::Edit),
        Just(Category::Comment),
    ]
}

/// A single user action against a small document pool.
#[derive(Debug, Clone)]
pub struct RecordOperation {
    /// Document the action targets.
    pub document: i64,
    /// Action time, Unix seconds.
    pub timestamp: i64,
}

/// Strategy for generating actions over `documents` distinct documents.
pub fn record_operation_strategy(documents: i64) -> impl Strategy<Value = RecordOperation> {
    (1..=documents, 0i64..1_000_000).prop_map(|(document, timestamp)| RecordOperation {
        document,
        timestamp,
    })
}

/// Strategy for generating a sequence of actions.
pub fn record_sequence_strategy(
    documents: i64,
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<RecordOperation>> {
    prop::collection::vec(record_operation_strategy(documents), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
