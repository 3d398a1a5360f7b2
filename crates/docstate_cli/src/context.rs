//! Opens the derived-state layer from command-line options.

use crate::error::{CliError, CliResult};
use crate::settings::FileSettings;
use docstate_core::{DerivedState, DocumentCatalog, InMemoryCatalog};
use docstate_store::{FileStore, KeyValueStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Where derived state lives.
#[derive(Debug, Clone)]
pub enum StoreTarget {
    /// A local JSON store file.
    File(PathBuf),
    /// A Redis server URL.
    Redis(String),
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Options {
    /// Store to open.
    pub store: StoreTarget,
    /// System-of-record catalog file.
    pub catalog: Option<PathBuf>,
    /// JSON config file.
    pub config: Option<PathBuf>,
    /// Token secret from the command line or environment.
    pub secret: Option<String>,
}

/// Opens the store named by `target`.
pub fn open_store(target: &StoreTarget) -> CliResult<Arc<dyn KeyValueStore>> {
    match target {
        StoreTarget::File(path) => {
            debug!(path = %path.display(), "opening file store");
            Ok(Arc::new(FileStore::open(path)?))
        }
        StoreTarget::Redis(url) => open_redis(url),
    }
}

#[cfg(feature = "redis")]
fn open_redis(url: &str) -> CliResult<Arc<dyn KeyValueStore>> {
    use docstate_store::{RedisStore, RetryConfig, RetryingStore};

    debug!("opening redis store");
    let store = RedisStore::open(url)?;
    Ok(Arc::new(RetryingStore::new(store, RetryConfig::default())))
}

#[cfg(not(feature = "redis"))]
fn open_redis(_url: &str) -> CliResult<Arc<dyn KeyValueStore>> {
    Err(CliError::RedisDisabled)
}

fn load_catalog(path: Option<&Path>, required: bool) -> CliResult<Arc<dyn DocumentCatalog>> {
    match path {
        Some(path) => {
            let catalog = InMemoryCatalog::load(path)?;
            debug!(documents = catalog.document_count(), "catalog loaded");
            Ok(Arc::new(catalog))
        }
        None if required => Err(CliError::MissingCatalog),
        None => Ok(Arc::new(InMemoryCatalog::new())),
    }
}

/// Opens the layer.
///
/// With `needs_catalog` set, a missing `--catalog` is an error: reconciling
/// against an empty catalog would treat every document as deleted.
pub fn open_state(options: &Options, needs_catalog: bool) -> CliResult<DerivedState> {
    let settings = match &options.config {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };
    let config = settings.into_config(options.secret.clone())?;
    let catalog = load_catalog(options.catalog.as_deref(), needs_catalog)?;
    let store = open_store(&options.store)?;
    Ok(DerivedState::open(config, store, catalog)?)
}
