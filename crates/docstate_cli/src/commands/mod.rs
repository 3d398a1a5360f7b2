//! CLI command implementations.

pub mod activity;
pub mod fingerprint;
pub mod purge;
pub mod session;

use crate::error::CliResult;
use serde::Serialize;

/// Output format accepted by `--format`.
pub const FORMATS: [&str; 2] = ["text", "json"];

/// Prints `value` as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
