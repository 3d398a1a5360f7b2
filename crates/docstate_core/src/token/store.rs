//! Session token records.
//!
//! Each login writes two records with the same TTL: `token -> email` and
//! `email -> token`. The pair is not written atomically and validation reads
//! only the first, so a token displaced by a newer login stays valid until its
//! own TTL elapses. Revocation only reaches the token the reverse index
//! currently points at.

use super::signer::{AuthConfig, TokenSigner};
use crate::error::{CoreError, CoreResult};
use crate::keys::{identity_key, token_key};
use crate::types::Identity;
use docstate_store::{Clock, KeyValueStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Issues, validates and revokes session tokens.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    signer: TokenSigner,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TokenStore {
    /// Creates a token store.
    pub fn new(store: Arc<dyn KeyValueStore>, auth: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = auth.token_expiry;
        Self {
            store,
            signer: TokenSigner::new(auth),
            clock,
            ttl,
        }
    }

    /// Issues a new token for `identity` and makes it the identity's current
    /// token.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if either write fails. A failure
    /// on the second write leaves a valid token without a reverse pointer.
    pub fn issue(&self, identity: &Identity) -> CoreResult<String> {
        // Round up so the claims never expire before the store records do.
        let issued_at = self.clock.now_millis().div_ceil(1000);
        let token = self.signer.sign(identity, issued_at)?;
        self.store.set_ex(&token_key(&token), &identity.email, self.ttl)?;
        self.store.set_ex(&identity_key(&identity.email), &token, self.ttl)?;
        debug!(user = %identity.user_id, email = %identity.email, "issued token");
        Ok(token)
    }

    /// Resolves `token` to the identity it was issued for.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no record exists for the token (never
    ///   issued, revoked, or expired)
    /// - [`CoreError::ValidationFailure`] if the record exists but the token's
    ///   signature or claims do not check out
    /// - [`CoreError::StoreUnavailable`] if the lookup fails
    pub fn validate(&self, token: &str) -> CoreResult<Identity> {
        let email = self
            .store
            .get(&token_key(token))?
            .ok_or_else(|| CoreError::not_found("token"))?;

        let claims = self.signer.verify(token, self.clock.now_secs())?;
        if claims.email != email {
            return Err(CoreError::validation_failure(
                "token claims do not match stored identity",
            ));
        }
        Ok(claims.identity())
    }

    /// Revokes the current token of `email`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the identity has no current token and
    /// [`CoreError::StoreUnavailable`] if a lookup or delete fails.
    pub fn revoke(&self, email: &str) -> CoreResult<()> {
        let token = self
            .store
            .get(&identity_key(email))?
            .ok_or_else(|| CoreError::not_found(format!("current token for {email}")))?;
        self.store.del(&token_key(&token))?;
        self.store.del(&identity_key(email))?;
        debug!(%email, "revoked token");
        Ok(())
    }

    /// Returns the token the reverse index currently advertises for `email`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the lookup fails.
    pub fn current_token(&self, email: &str) -> CoreResult<Option<String>> {
        Ok(self.store.get(&identity_key(email))?)
    }

    /// Configured token lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("signer", &self.signer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
