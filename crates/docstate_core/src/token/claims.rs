//! Token claims.

use crate::types::{Identity, UserId};
use serde::{Deserialize, Serialize};

/// The signed payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID of the holder.
    pub uid: i64,
    /// Login e-mail of the holder.
    pub email: String,
    /// Issue time, Unix seconds.
    pub iat: u64,
    /// Expiry time, Unix seconds.
    pub exp: u64,
    /// Issuer.
    pub iss: String,
    /// Unique token ID.
    pub jti: String,
}

impl Claims {
    /// Builds claims for `identity` issued at `now_secs` and valid for
    /// `ttl_secs`.
    pub fn new(identity: &Identity, issuer: &str, now_secs: u64, ttl_secs: u64) -> Self {
        Self {
            uid: identity.user_id.as_i64(),
            email: identity.email.clone(),
            iat: now_secs,
            exp: now_secs.saturating_add(ttl_secs),
            iss: issuer.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Returns true once `now_secs` has reached the expiry.
    #[must_use]
    pub fn is_expired(&self, now_secs: u64) -> bool {
        now_secs >= self.exp
    }

    /// The identity these claims were issued for.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(UserId::new(self.uid), self.email.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary() {
        let identity = Identity::new(UserId::new(1), "ada@example.com");
        let claims = Claims::new(&identity, "docstate", 1_000, 60);
        assert_eq!(claims.exp, 1_060);
        assert!(!claims.is_expired(1_059));
        assert!(claims.is_expired(1_060));
        assert_eq!(claims.identity(), identity);
    }

    #[test]
    fn token_ids_are_unique() {
        let identity = Identity::new(UserId::new(1), "ada@example.com");
        let a = Claims::new(&identity, "docstate", 1_000, 60);
        let b = Claims::new(&identity, "docstate", 1_000, 60);
        assert_ne!(a.jti, b.jti);
    }
}
