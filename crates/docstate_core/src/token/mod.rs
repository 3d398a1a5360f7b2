//! Session token lifecycle.

mod claims;
mod signer;
mod store;

pub use claims::Claims;
pub use signer::{AuthConfig, TokenSigner};
pub use store::TokenStore;
