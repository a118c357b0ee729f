//! Per-plugin write locks.
//!
//! A cache file is a single-writer resource: every load-mutate-save sequence
//! runs while holding the lock keyed by the plugin's path name. Cache-only
//! readers never take it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of async mutexes keyed by cache file stem.
#[derive(Debug, Clone, Default)]
pub struct CacheLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl CacheLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the cache file stem `path_name`.
    pub async fn acquire(&self, path_name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                locks
                    .entry(path_name.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}
