//! Token signing using HMAC-SHA256.
//!
//! ## Token Format
//!
//! `base64url(claims JSON) "." base64url(HMAC-SHA256(claims JSON))`, both
//! parts unpadded. The token is opaque to callers; only the signer that
//! issued it (or one sharing its secret) can verify it.

use super::claims::Claims;
use crate::error::{CoreError, CoreResult};
use crate::types::Identity;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Token lifetime.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration.
    pub fn new(secret: impl Into<Vec<u8>>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            token_expiry: crate::config::DEFAULT_TOKEN_TTL,
        }
    }

    /// Sets the token lifetime.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("token_expiry", &self.token_expiry)
            .finish_non_exhaustive()
    }
}

/// Creates and verifies signed tokens.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    config: AuthConfig,
}

impl TokenSigner {
    /// Creates a new signer.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Creates a token for `identity` issued at `now_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the secret is unusable.
    pub fn sign(&self, identity: &Identity, now_secs: u64) -> CoreResult<String> {
        let claims = Claims::new(
            identity,
            &self.config.issuer,
            now_secs,
            self.config.token_expiry.as_secs(),
        );
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| CoreError::invalid_config(format!("cannot encode claims: {e}")))?;
        let signature = self.mac(&payload)?.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verifies a token's signature and claims at `now_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ValidationFailure`] if the token is malformed,
    /// carries a bad signature, names another issuer, or has expired.
    pub fn verify(&self, token: &str, now_secs: u64) -> CoreResult<Claims> {
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| CoreError::validation_failure("invalid token format"))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| CoreError::validation_failure("invalid token encoding"))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| CoreError::validation_failure("invalid token encoding"))?;

        self.mac(&payload)?
            .verify_slice(&signature)
            .map_err(|_| CoreError::validation_failure("invalid signature"))?;

        let claims: Claims = serde_json::from_slice(&payload)
            .map_err(|e| CoreError::validation_failure(format!("invalid claims: {e}")))?;

        if claims.iss != self.config.issuer {
            return Err(CoreError::validation_failure("issuer mismatch"));
        }
        if claims.is_expired(now_secs) {
            return Err(CoreError::validation_failure("token expired"));
        }
        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> CoreResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| CoreError::invalid_config(format!("unusable token secret: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}
