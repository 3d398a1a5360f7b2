//! Identifier and category types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a user in the system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Creates a new user ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a document in the system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl DocumentId {
    /// Creates a new document ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a knowledge base in the system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBaseId(pub i64);

impl KnowledgeBaseId {
    /// Creates a new knowledge base ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for KnowledgeBaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated principal.
///
/// Owned by the system of record; the derived layer only references it. The
/// e-mail is the unique login key and names the token records, the user ID
/// names the activity lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// The user's ID.
    pub user_id: UserId,
    /// The user's unique login e-mail.
    pub email: String,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// The kind of action a recent-activity list tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Documents the user opened.
    View,
    /// Documents the user changed.
    Edit,
    /// Documents the user commented on.
    Comment,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 3] = [Category::View, Category::Edit, Category::Comment];

    /// Key prefix of this category's ranked sets.
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Category::View => "user_recent_view_docs",
            Category::Edit => "user_recent_edit_docs",
            Category::Comment => "user_recent_comment_docs",
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::View => "view",
            Category::Edit => "edit",
            Category::Comment => "comment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "view" => Ok(Category::View),
            "edit" => Ok(Category::Edit),
            "comment" => Ok(Category::Comment),
            other => Err(format!("unknown category {other:?} (expected view, edit or comment)")),
        }
    }
}
