//! Content fingerprint commands.

use crate::error::CliResult;
use docstate_core::{content_hash, DerivedState, DocumentId};
use std::path::Path;

/// Runs `fingerprint set`.
pub fn run_set(state: &DerivedState, document: i64, hash: &str) -> CliResult<()> {
    state.fingerprints().set(DocumentId::new(document), hash)?;
    println!("Stored fingerprint for document {document}");
    Ok(())
}

/// Runs `fingerprint get`. A missing or expired fingerprint is reported as an
/// error.
pub fn run_get(state: &DerivedState, document: i64) -> CliResult<()> {
    let hash = state.fingerprints().get(DocumentId::new(document))?;
    println!("{hash}");
    Ok(())
}

/// Hashes `file`, storing the result for `document` when one is given.
pub fn hash_file(
    state: Option<&DerivedState>,
    file: &Path,
    document: Option<i64>,
) -> CliResult<String> {
    let body = std::fs::read(file)?;
    match (state, document) {
        (Some(state), Some(document)) => Ok(state
            .events()
            .document_created(DocumentId::new(document), &body)?),
        _ => Ok(content_hash(&body)),
    }
}
