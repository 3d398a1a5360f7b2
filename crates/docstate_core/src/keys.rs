//! Key naming for the derived store.
//!
//! These names are shared with existing deployments and must not change.

use crate::types::{Category, DocumentId, UserId};

/// Prefix of content fingerprint keys.
pub const FINGERPRINT_PREFIX: &str = "documentContentHash";

/// Ranked set holding `user`'s recent documents for `category`.
#[must_use]
pub fn activity_key(category: Category, user: UserId) -> String {
    format!("{}:{}", category.key_prefix(), user)
}

/// String key holding the content fingerprint of `document`.
#[must_use]
pub fn fingerprint_key(document: DocumentId) -> String {
    format!("{FINGERPRINT_PREFIX}:{document}")
}

/// String key mapping a token to the e-mail it was issued for.
///
/// The token itself is the key.
#[must_use]
pub fn token_key(token: &str) -> String {
    token.to_string()
}

/// String key mapping an e-mail to its current token.
///
/// The e-mail itself is the key.
#[must_use]
pub fn identity_key(email: &str) -> String {
    email.to_string()
}
