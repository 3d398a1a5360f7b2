//! Session token commands.

use super::print_json;
use crate::error::CliResult;
use docstate_core::{DerivedState, Identity, UserId};
use serde::Serialize;
use tracing::info;

/// Result of a login.
#[derive(Debug, Serialize)]
pub struct LoginOutput {
    /// Issued token.
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// Issues a token for `email`, replacing any earlier one.
pub fn login(state: &DerivedState, user: i64, email: &str) -> CliResult<LoginOutput> {
    let identity = Identity::new(UserId::new(user), email);
    let token = state.tokens().issue(&identity)?;
    Ok(LoginOutput {
        token,
        expires_in: state.tokens().ttl().as_secs(),
    })
}

/// Runs `login`.
pub fn run_login(state: &DerivedState, user: i64, email: &str, format: &str) -> CliResult<()> {
    let out = login(state, user, email)?;
    info!(%email, "token issued");
    if format == "json" {
        return print_json(&out);
    }
    println!("{}", out.token);
    Ok(())
}

/// Runs `whoami`: validates `token` and prints its identity.
pub fn run_whoami(state: &DerivedState, token: &str, format: &str) -> CliResult<()> {
    let identity = state.tokens().validate(token)?;
    if format == "json" {
        return print_json(&identity);
    }
    println!("user {} <{}>", identity.user_id, identity.email);
    Ok(())
}

/// Revokes the session of `email`. Returns `false` if there was none.
pub fn logout(state: &DerivedState, email: &str) -> CliResult<bool> {
    match state.tokens().revoke(email) {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Runs `logout`.
pub fn run_logout(state: &DerivedState, email: &str) -> CliResult<()> {
    if logout(state, email)? {
        println!("Logged out {email}");
    } else {
        println!("No active session for {email}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstate_core::{Config, InMemoryCatalog};
    use std::sync::Arc;

    fn state() -> DerivedState {
        DerivedState::open_in_memory(Config::new("s"), Arc::new(InMemoryCatalog::new())).unwrap()
    }

    #[test]
    fn login_then_logout() {
        let state = state();
        let out = login(&state, 7, "a@example.com").unwrap();
        assert_eq!(out.expires_in, 7200);
        assert_eq!(
            state.tokens().validate(&out.token).unwrap().user_id,
            UserId::new(7)
        );

        assert!(logout(&state, "a@example.com").unwrap());
        assert!(state.tokens().validate(&out.token).is_err());
    }

    #[test]
    fn logout_without_session_is_a_no_op() {
        assert!(!logout(&state(), "nobody@example.com").unwrap());
    }
}
