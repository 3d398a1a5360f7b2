//! Error types for the derived-state layer.

use crate::catalog::CatalogError;
use docstate_store::StoreError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in derived-state operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The key-value store could not be reached or rejected a command.
    ///
    /// Never retried by this layer.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The requested record is absent or has expired.
    #[error("not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// A stored ranked-set member could not be decoded.
    #[error("malformed entry in {key}: {reason}")]
    MalformedEntry {
        /// The ranked-set key holding the member.
        key: String,
        /// Why decoding failed.
        reason: String,
    },

    /// An entry could not be encoded for storage.
    #[error("cannot encode entry: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A token is present but its signature or claims are invalid.
    #[error("token validation failed: {reason}")]
    ValidationFailure {
        /// Why validation failed.
        reason: String,
    },

    /// The system of record could not answer a lookup.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a malformed-entry error.
    pub fn malformed_entry(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a validation failure.
    pub fn validation_failure(reason: impl Into<String>) -> Self {
        Self::ValidationFailure {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }

    /// Returns true if a token check with this outcome must be answered
    /// as unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound { .. } | CoreError::ValidationFailure { .. }
        )
    }

    /// Returns true if this is an internal/server-side failure.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            CoreError::StoreUnavailable(_)
                | CoreError::Catalog(_)
                | CoreError::InvalidConfig { .. }
                | CoreError::Encoding(_)
        )
    }
}
