//! Purge command implementation.

use crate::error::CliResult;
use docstate_store::FileStore;
use std::path::Path;

/// Drops expired keys from a file store and rewrites it. Returns the number
/// of keys removed.
pub fn purge(path: &Path) -> CliResult<usize> {
    let store = FileStore::open(path)?;
    Ok(store.purge_expired()?)
}

/// Runs `purge`.
pub fn run(path: &Path, dry_run: bool) -> CliResult<()> {
    if dry_run {
        println!("Would purge expired keys from {}", path.display());
        return Ok(());
    }
    let removed = purge(path)?;
    println!("Purged {removed} expired key(s) from {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstate_store::{KeyValueStore, ManualClock};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn purge_removes_only_expired_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        {
            let clock = Arc::new(ManualClock::at_secs(1));
            let store = FileStore::open_with_clock(&path, clock).unwrap();
            // Written at t=1s, so these expire long before the real clock reads them.
            store.set_ex("old", "v", Duration::from_secs(1)).unwrap();
            store.zadd("live", "m", 1.0).unwrap();
        }
        assert_eq!(purge(&path).unwrap(), 1);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.zcard("live").unwrap(), 1);
        assert_eq!(store.get("old").unwrap(), None);
    }
}
