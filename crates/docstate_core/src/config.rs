//! Derived-state configuration.

use crate::error::{CoreError, CoreResult};
use std::time::Duration;

/// Default lifetime of a session token and its reverse index record.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Default lifetime of a content fingerprint.
pub const DEFAULT_FINGERPRINT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default bound on each recent-activity list.
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 50;

/// Default number of stale entries removed by a single fetch.
pub const DEFAULT_MAX_TOMBSTONES_PER_FETCH: usize = 32;

/// Default `iss` claim of issued tokens.
pub const DEFAULT_ISSUER: &str = "docstate";

/// Configuration for opening the derived-state layer.
#[derive(Clone)]
pub struct Config {
    /// HMAC key used to sign and verify tokens.
    pub secret: Vec<u8>,

    /// Issuer written into and expected from token claims.
    pub issuer: String,

    /// Lifetime of both token records.
    pub token_ttl: Duration,

    /// Lifetime of a content fingerprint.
    pub fingerprint_ttl: Duration,

    /// Maximum number of entries kept per (user, category).
    pub activity_capacity: usize,

    /// Stale entries a single fetch may remove before it stops scanning
    /// (`None` = unbounded).
    pub max_tombstones_per_fetch: Option<usize>,
}

impl Config {
    /// Creates a configuration with default values and the given signing secret.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            token_ttl: DEFAULT_TOKEN_TTL,
            fingerprint_ttl: DEFAULT_FINGERPRINT_TTL,
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
            max_tombstones_per_fetch: Some(DEFAULT_MAX_TOMBSTONES_PER_FETCH),
        }
    }

    /// Sets the token issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the token lifetime.
    #[must_use]
    pub const fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Sets the fingerprint lifetime.
    #[must_use]
    pub const fn with_fingerprint_ttl(mut self, ttl: Duration) -> Self {
        self.fingerprint_ttl = ttl;
        self
    }

    /// Sets the per-list capacity.
    #[must_use]
    pub const fn with_activity_capacity(mut self, capacity: usize) -> Self {
        self.activity_capacity = capacity;
        self
    }

    /// Sets the reconciliation cap per fetch.
    #[must_use]
    pub const fn with_max_tombstones_per_fetch(mut self, cap: Option<usize>) -> Self {
        self.max_tombstones_per_fetch = cap;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for an empty secret, a zero
    /// capacity, a zero TTL or a zero tombstone cap.
    pub fn validate(&self) -> CoreResult<()> {
        if self.secret.is_empty() {
            return Err(CoreError::invalid_config("token secret must not be empty"));
        }
        if self.activity_capacity == 0 {
            return Err(CoreError::invalid_config("activity capacity must be at least 1"));
        }
        if self.token_ttl.is_zero() {
            return Err(CoreError::invalid_config("token TTL must be non-zero"));
        }
        if self.fingerprint_ttl.is_zero() {
            return Err(CoreError::invalid_config("fingerprint TTL must be non-zero"));
        }
        if self.max_tombstones_per_fetch == Some(0) {
            return Err(CoreError::invalid_config(
                "tombstone cap must be at least 1 (use None to disable it)",
            ));
        }
        Ok(())
    }
}

// The secret never appears in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("token_ttl", &self.token_ttl)
            .field("fingerprint_ttl", &self.fingerprint_ttl)
            .field("activity_capacity", &self.activity_capacity)
            .field("max_tombstones_per_fetch", &self.max_tombstones_per_fetch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::new("s3cret");
        assert_eq!(config.token_ttl, Duration::from_secs(7200));
        assert_eq!(config.fingerprint_ttl, Duration::from_secs(604_800));
        assert_eq!(config.activity_capacity, 50);
        assert_eq!(config.max_tombstones_per_fetch, Some(32));
        assert_eq!(config.issuer, "docstate");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new("s3cret")
            .with_issuer("kb")
            .with_token_ttl(Duration::from_secs(60))
            .with_activity_capacity(5)
            .with_max_tombstones_per_fetch(None);

        assert_eq!(config.issuer, "kb");
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.activity_capacity, 5);
        assert_eq!(config.max_tombstones_per_fetch, None);
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(Config::new("").validate().is_err());
        assert!(Config::new("k").with_activity_capacity(0).validate().is_err());
        assert!(Config::new("k").with_token_ttl(Duration::ZERO).validate().is_err());
        assert!(Config::new("k")
            .with_max_tombstones_per_fetch(Some(0))
            .validate()
            .is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", Config::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
