//! Compatibility vectors for stored data.
//!
//! Existing deployments already hold ranked-set members and keys in a fixed
//! byte format. These vectors pin that format so a writer that drifts from it
//! (and would start duplicating entries) fails loudly.

use docstate_core::{ActivityEntry, Category, DocumentId, KnowledgeBaseId, UserId};
use serde::{Deserialize, Serialize};

/// A stored-member vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Entry to encode.
    pub entry: ActivityEntry,
    /// Exact member bytes already present in deployed stores.
    pub member: String,
}

/// A key-naming vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Key produced by the current code.
    pub actual: String,
    /// Key used by deployed stores.
    pub expected: String,
}

fn member(id: &str, description: &str, entry: ActivityEntry, bytes: &str) -> MemberVector {
    MemberVector {
        id: id.into(),
        description: description.into(),
        entry,
        member: bytes.into(),
    }
}

/// Member encoding vectors.
pub fn member_vectors() -> Vec<MemberVector> {
    vec![
        member(
            "member_plain",
            "ASCII title and knowledge base name",
            ActivityEntry::new(
                DocumentId::new(1_869_431_102_213_083_136),
                "Release checklist",
                KnowledgeBaseId::new(1_869_430_977_226_072_064),
                "Engineering",
            ),
            r#"{"doc_id":1869431102213083136,"doc_title":"Release checklist","kb_id":1869430977226072064,"kb_name":"Engineering"}"#,
        ),
        member(
            "member_html",
            "HTML-sensitive characters are escaped",
            ActivityEntry::new(DocumentId::new(2), "<script>&", KnowledgeBaseId::new(3), "a>b"),
            r#"{"doc_id":2,"doc_title":"\u003cscript\u003e\u0026","kb_id":3,"kb_name":"a\u003eb"}"#,
        ),
        member(
            "member_separators",
            "Line and paragraph separators are escaped",
            ActivityEntry::new(
                DocumentId::new(4),
                "x\u{2028}y",
                KnowledgeBaseId::new(5),
                "\u{2029}",
            ),
            r#"{"doc_id":4,"doc_title":"x\u2028y","kb_id":5,"kb_name":"\u2029"}"#,
        ),
        member(
            "member_unicode",
            "Other non-ASCII text is written as UTF-8",
            ActivityEntry::new(
                DocumentId::new(6),
                "\u{8bbe}\u{8ba1}",
                KnowledgeBaseId::new(7),
                "caf\u{e9}",
            ),
            "{\"doc_id\":6,\"doc_title\":\"\u{8bbe}\u{8ba1}\",\"kb_id\":7,\"kb_name\":\"caf\u{e9}\"}",
        ),
        member(
            "member_quotes",
            "Quotes, backslashes, newlines and tabs use short escapes",
            ActivityEntry::new(DocumentId::new(8), "a\"b\\c\nd", KnowledgeBaseId::new(9), ""),
            r#"{"doc_id":8,"doc_title":"a\"b\\c\nd","kb_id":9,"kb_name":""}"#,
        ),
        member(
            "member_short_controls",
            "Backspace and form feed use long escapes",
            ActivityEntry::new(DocumentId::new(10), "a\u{8}b\u{c}", KnowledgeBaseId::new(11), "\u{1f}"),
            r#"{"doc_id":10,"doc_title":"a\u0008b\u000c","kb_id":11,"kb_name":"\u001f"}"#,
        ),
        member(
            "member_negative",
            "Negative identifiers",
            ActivityEntry::new(DocumentId::new(-1), "t", KnowledgeBaseId::new(-2), "n"),
            r#"{"doc_id":-1,"doc_title":"t","kb_id":-2,"kb_name":"n"}"#,
        ),
    ]
}

/// Key naming vectors.
pub fn key_vectors() -> Vec<KeyVector> {
    let user = UserId::new(42);
    let mut vectors: Vec<KeyVector> = Category::ALL
        .iter()
        .map(|&category| KeyVector {
            id: format!("key_activity_{category}"),
            actual: docstate_core::keys::activity_key(category, user),
            expected: format!("user_recent_{category}_docs:42"),
        })
        .collect();
    vectors.push(KeyVector {
        id: "key_fingerprint".into(),
        actual: docstate_core::keys::fingerprint_key(DocumentId::new(42)),
        expected: "documentContentHash:42".into(),
    });
    vectors
}

/// Exports all vectors as JSON.
pub fn all_vectors_json() -> String {
    #[derive(Serialize)]
    struct AllVectors {
        members: Vec<MemberVector>,
        keys: Vec<KeyVector>,
    }

    let all = AllVectors {
        members: member_vectors(),
        keys: key_vectors(),
    };

    serde_json::to_string_pretty(&all).expect("Failed to serialize vectors")
}
