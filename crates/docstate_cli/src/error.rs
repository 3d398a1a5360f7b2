//! CLI error type.

use docstate_core::{CatalogError, CoreError};
use docstate_store::StoreError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// No signing secret was configured.
    #[error("no token secret configured (set DOCSTATE_SECRET, pass --secret, or add \"secret\" to the config file)")]
    MissingSecret,

    /// The command needs the system-of-record catalog.
    #[error("this command needs a document catalog (pass --catalog <path>)")]
    MissingCatalog,

    /// A Redis URL was given but the binary was built without Redis support.
    #[error("Redis support is not compiled in (rebuild with --features redis)")]
    RedisDisabled,

    /// The config file is unusable.
    #[error("invalid config file {path}: {message}")]
    Config {
        /// Config file path.
        path: String,
        /// What was wrong.
        message: String,
    },

    /// A file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be rendered.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A derived-state operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
