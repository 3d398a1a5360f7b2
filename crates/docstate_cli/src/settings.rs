//! Config file handling.
//!
//! The optional config file is JSON with durations in seconds:
//!
//! ```json
//! {
//!   "secret": "...",
//!   "issuer": "docstate",
//!   "token_ttl_secs": 7200,
//!   "fingerprint_ttl_secs": 604800,
//!   "activity_capacity": 50,
//!   "max_tombstones_per_fetch": 32
//! }
//! ```
//!
//! Every field is optional. A `max_tombstones_per_fetch` of 0 removes the cap.

use crate::error::{CliError, CliResult};
use docstate_core::Config;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Settings read from the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    /// Token signing secret.
    pub secret: Option<String>,
    /// Token issuer.
    pub issuer: Option<String>,
    /// Token lifetime in seconds.
    pub token_ttl_secs: Option<u64>,
    /// Fingerprint lifetime in seconds.
    pub fingerprint_ttl_secs: Option<u64>,
    /// Entries kept per (user, category).
    pub activity_capacity: Option<usize>,
    /// Stale entries removed per fetch (0 = unbounded).
    pub max_tombstones_per_fetch: Option<usize>,
}

impl FileSettings {
    /// Loads settings from `path`.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|message| CliError::Config {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parses settings from JSON text.
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Builds the core configuration. `secret` (from the command line or
    /// environment) wins over the file.
    pub fn into_config(self, secret: Option<String>) -> CliResult<Config> {
        let secret = secret
            .or(self.secret)
            .filter(|s| !s.is_empty())
            .ok_or(CliError::MissingSecret)?;

        let mut config = Config::new(secret);
        if let Some(issuer) = self.issuer {
            config = config.with_issuer(issuer);
        }
        if let Some(secs) = self.token_ttl_secs {
            config = config.with_token_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = self.fingerprint_ttl_secs {
            config = config.with_fingerprint_ttl(Duration::from_secs(secs));
        }
        if let Some(capacity) = self.activity_capacity {
            config = config.with_activity_capacity(capacity);
        }
        if let Some(cap) = self.max_tombstones_per_fetch {
            config = config.with_max_tombstones_per_fetch((cap > 0).then_some(cap));
        }
        Ok(config)
    }
}
