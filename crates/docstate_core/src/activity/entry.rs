//! Ranked-set member encoding.
//!
//! A member is a compact JSON object `{"doc_id","doc_title","kb_id","kb_name"}`
//! with keys in that order and with `<`, `>`, `&`, U+2028 and U+2029 written
//! as `\u` escapes. Existing deployments write exactly these bytes, and the
//! ranked set deduplicates by bytes, so any drift here would turn a repeat
//! action into a second entry.

use crate::catalog::DocumentMeta;
use crate::error::{CoreError, CoreResult};
use crate::types::{DocumentId, KnowledgeBaseId};
use serde::{Deserialize, Serialize};
use serde_json::ser::{CharEscape, CompactFormatter, Formatter};
use std::io;

/// One document reference in a recent-activity list.
///
/// The action timestamp is not part of the entry; it is the member's score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Referenced document.
    pub doc_id: i64,
    /// Document title at record time.
    pub doc_title: String,
    /// Owning knowledge base.
    pub kb_id: i64,
    /// Knowledge base name at record time.
    pub kb_name: String,
}

impl ActivityEntry {
    /// Creates an entry.
    pub fn new(
        doc_id: DocumentId,
        doc_title: impl Into<String>,
        kb_id: KnowledgeBaseId,
        kb_name: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.as_i64(),
            doc_title: doc_title.into(),
            kb_id: kb_id.as_i64(),
            kb_name: kb_name.into(),
        }
    }

    /// Creates an entry from catalog metadata.
    pub fn from_meta(meta: &DocumentMeta, kb_name: impl Into<String>) -> Self {
        Self::new(meta.id, meta.title.clone(), meta.knowledge_base_id, kb_name)
    }

    /// The referenced document.
    #[must_use]
    pub fn document_id(&self) -> DocumentId {
        DocumentId::new(self.doc_id)
    }

    /// Encodes the entry as a ranked-set member.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encoding`] if serialization fails.
    pub fn encode(&self) -> CoreResult<String> {
        let mut buf = Vec::with_capacity(64 + self.doc_title.len() + self.kb_name.len());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, HtmlSafeFormatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| CoreError::Encoding(serde::ser::Error::custom(e)))
    }

    /// Decodes a member read from the ranked set at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedEntry`] if `member` is not a JSON object
    /// with the four entry fields.
    pub fn decode(key: &str, member: &str) -> CoreResult<Self> {
        serde_json::from_str(member).map_err(|e| CoreError::malformed_entry(key, e.to_string()))
    }
}

/// Compact JSON with the escaping of an HTML-safe encoder.
///
/// `<`, `>`, `&`, U+2028 and U+2029 become `\u` escapes, and control
/// characters without a two-character form other than `\n`, `\r` and `\t`
/// are written as `\u00XX`.
struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if matches!(c, '<' | '>' | '&' | '\u{2028}' | '\u{2029}') {
                writer.write_all(fragment[start..i].as_bytes())?;
                write!(writer, "\\u{:04x}", u32::from(c))?;
                start = i + c.len_utf8();
            }
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        match char_escape {
            CharEscape::Backspace => writer.write_all(b"\\u0008"),
            CharEscape::FormFeed => writer.write_all(b"\\u000c"),
            other => CompactFormatter.write_char_escape(writer, other),
        }
    }
}

/// A `Fetch` result row: an entry plus its action time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentDocument {
    /// Referenced document.
    pub doc_id: i64,
    /// Document title at record time.
    pub doc_title: String,
    /// Owning knowledge base.
    pub kb_id: i64,
    /// Knowledge base name at record time.
    pub kb_name: String,
    /// Unix seconds of the most recent action.
    pub timestamp: i64,
}

impl RecentDocument {
    /// Joins an entry with its score.
    pub fn from_scored(entry: ActivityEntry, score: f64) -> Self {
        Self {
            doc_id: entry.doc_id,
            doc_title: entry.doc_title,
            kb_id: entry.kb_id,
            kb_name: entry.kb_name,
            // Scores are whole seconds.
            timestamp: score as i64,
        }
    }

    /// The referenced document.
    #[must_use]
    pub fn document_id(&self) -> DocumentId {
        DocumentId::new(self.doc_id)
    }
}
