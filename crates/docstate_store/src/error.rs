//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The connection to a remote store failed or was dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// The key holds a value of a different kind than the command expects.
    #[error("wrong kind of value held at key {key:?}")]
    WrongType {
        /// The key that was addressed.
        key: String,
    },

    /// The store answered with an error reply.
    #[error("command failed: {0}")]
    Command(String),

    /// A command argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Persisted store contents could not be interpreted.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// A snapshot could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates a wrong-type error for `key`.
    pub fn wrong_type(key: impl Into<String>) -> Self {
        Self::WrongType { key: key.into() }
    }

    /// Returns true if retrying the same command may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Connection(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            StoreError::Io(err.into())
        } else if err.is_data() || err.is_syntax() || err.is_eof() {
            StoreError::Corrupted(err.to_string())
        } else {
            StoreError::Serialization(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Connection("reset".into()).is_transient());
        assert!(StoreError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).is_transient());
        assert!(!StoreError::Closed.is_transient());
        assert!(!StoreError::wrong_type("k").is_transient());
        assert!(!StoreError::Command("ERR".into()).is_transient());
    }

    #[test]
    fn json_syntax_errors_are_corruption() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Corrupted(_)));
    }

    #[test]
    fn wrong_type_display_names_key() {
        let msg = StoreError::wrong_type("user_recent_view_docs:7").to_string();
        assert!(msg.contains("user_recent_view_docs:7"));
    }
}
