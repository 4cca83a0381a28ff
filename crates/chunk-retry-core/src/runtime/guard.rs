//! Per-chunk exclusion: at most one retry episode in flight per chunk id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of chunk id -> async lock. Entries live as long as the registry,
/// like the retry records they protect.
#[derive(Debug, Default)]
pub(crate) struct ChunkLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ChunkLocks {
    /// Wait until no other episode holds `chunk_id`, then hold it until the guard drops.
    pub(crate) async fn acquire(&self, chunk_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(locks.entry(chunk_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
