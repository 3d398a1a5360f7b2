//! Derived-state facade.

use crate::activity::{ActivityRanker, DocumentEvents};
use crate::catalog::DocumentCatalog;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::fingerprint::FingerprintCache;
use crate::token::{AuthConfig, TokenStore};
use docstate_store::{Clock, InMemoryStore, KeyValueStore, SystemClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// The main derived-state handle.
///
/// Owns one store client shared by every component. Construct it once at
/// process start and hand clones to workers; all clones share the same client.
///
/// ```rust,ignore
/// use docstate_core::{Config, DerivedState, Identity, InMemoryCatalog, UserId};
/// use docstate_store::InMemoryStore;
/// use std::sync::Arc;
///
/// let state = DerivedState::open(
///     Config::new("secret"),
///     Arc::new(InMemoryStore::new()),
///     Arc::new(InMemoryCatalog::new()),
/// )?;
/// let token = state.tokens().issue(&Identity::new(UserId::new(1), "ada@example.com"))?;
/// state.shutdown()?;
/// ```
#[derive(Clone)]
pub struct DerivedState {
    config: Config,
    store: Arc<dyn KeyValueStore>,
    tokens: TokenStore,
    activity: ActivityRanker,
    fingerprints: FingerprintCache,
    events: DocumentEvents,
    is_open: Arc<AtomicBool>,
}

impl DerivedState {
    /// Opens the layer over `store` and `catalog` using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `config` is unusable and
    /// [`CoreError::StoreUnavailable`] if the store does not answer a ping.
    pub fn open(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn DocumentCatalog>,
    ) -> CoreResult<Self> {
        Self::open_with_clock(config, store, catalog, Arc::new(SystemClock))
    }

    /// Opens the layer with an explicit clock for token and activity times.
    ///
    /// The clock should be the one the store uses for expiry.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn open_with_clock(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn DocumentCatalog>,
        clock: Arc<dyn Clock>,
    ) -> CoreResult<Self> {
        config.validate()?;
        store.ping()?;

        let auth = AuthConfig::new(config.secret.clone(), config.issuer.clone())
            .with_expiry(config.token_ttl);
        let tokens = TokenStore::new(Arc::clone(&store), auth, Arc::clone(&clock));
        let activity = ActivityRanker::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            config.activity_capacity,
            config.max_tombstones_per_fetch,
        );
        let fingerprints = FingerprintCache::new(Arc::clone(&store), config.fingerprint_ttl);
        let events = DocumentEvents::new(
            activity.clone(),
            fingerprints.clone(),
            catalog,
            clock,
        );

        info!(
            capacity = config.activity_capacity,
            token_ttl_secs = config.token_ttl.as_secs(),
            "derived state opened"
        );

        Ok(Self {
            config,
            store,
            tokens,
            activity,
            fingerprints,
            events,
            is_open: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Opens the layer over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `config` is unusable.
    pub fn open_in_memory(config: Config, catalog: Arc<dyn DocumentCatalog>) -> CoreResult<Self> {
        Self::open(config, Arc::new(InMemoryStore::new()), catalog)
    }

    /// Session tokens.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Recent-activity lists.
    #[must_use]
    pub fn activity(&self) -> &ActivityRanker {
        &self.activity
    }

    /// Content fingerprints.
    #[must_use]
    pub fn fingerprints(&self) -> &FingerprintCache {
        &self.fingerprints
    }

    /// Document action hooks.
    #[must_use]
    pub fn events(&self) -> &DocumentEvents {
        &self.events
    }

    /// The configuration this handle was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared store client.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Checks if the handle is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open.load(Ordering::Acquire)
    }

    /// Closes the store client. Later calls are no-ops.
    ///
    /// Every clone shares the client, so operations on any clone fail with
    /// [`CoreError::StoreUnavailable`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the store fails to close.
    pub fn shutdown(&self) -> CoreResult<()> {
        if !self.is_open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.store.close().map_err(CoreError::from)?;
        debug!("derived state shut down");
        Ok(())
    }
}

impl std::fmt::Debug for DerivedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedState")
            .field("config", &self.config)
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}
