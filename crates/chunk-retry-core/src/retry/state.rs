//! Process-wide per-chunk retry records.
//!
//! Records are created lazily on a chunk's first failure and live as long as
//! the store. Budgets only ever count down; the local budget is never
//! replenished and the domain budget resets only when the cursor advances.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Position in the fallback-domain list for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainCursor {
    /// Index into the configured fallback domains.
    pub index: usize,
    /// Attempts left against the domain at `index`.
    pub retries_remaining: u32,
}

/// Retry bookkeeping for one chunk id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRetryRecord {
    pub local_retries_remaining: u32,
    /// `None` until failover is entered for the first time.
    pub failover: Option<DomainCursor>,
}

/// Store of [`ChunkRetryRecord`]s keyed by chunk id.
#[derive(Debug, Default)]
pub struct RetryStateStore {
    records: Mutex<HashMap<String, ChunkRetryRecord>>,
}

impl RetryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ChunkRetryRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Consume one local retry for `chunk_id`, creating the record with
    /// `max_retries` on first use. Returns the 1-based ordinal of the retry
    /// to issue, or `None` once the budget is spent.
    pub fn take_local_retry(&self, chunk_id: &str, max_retries: u32) -> Option<u32> {
        let mut records = self.lock();
        let record = records
            .entry(chunk_id.to_string())
            .or_insert_with(|| ChunkRetryRecord {
                local_retries_remaining: max_retries,
                failover: None,
            });
        if record.local_retries_remaining == 0 {
            return None;
        }
        let ordinal = max_retries.saturating_sub(record.local_retries_remaining) + 1;
        record.local_retries_remaining -= 1;
        Some(ordinal)
    }

    /// Enter failover for `chunk_id`. The cursor starts at 0 on first entry;
    /// later entries resume where the previous episode stopped.
    pub fn enter_failover(&self, chunk_id: &str, domain_budget: u32) -> DomainCursor {
        let mut records = self.lock();
        let record = records
            .entry(chunk_id.to_string())
            .or_insert_with(|| ChunkRetryRecord {
                local_retries_remaining: 0,
                failover: None,
            });
        *record.failover.get_or_insert(DomainCursor {
            index: 0,
            retries_remaining: domain_budget,
        })
    }

    /// Record a failed attempt against the current fallback domain.
    ///
    /// While more than one attempt remains the same domain is kept;
    /// otherwise the cursor advances and the budget resets to `domain_budget`.
    pub fn record_domain_failure(&self, chunk_id: &str, domain_budget: u32) -> DomainCursor {
        let mut records = self.lock();
        let record = records
            .entry(chunk_id.to_string())
            .or_insert_with(|| ChunkRetryRecord {
                local_retries_remaining: 0,
                failover: None,
            });
        let cursor = record.failover.get_or_insert(DomainCursor {
            index: 0,
            retries_remaining: domain_budget,
        });
        if cursor.retries_remaining > 1 {
            cursor.retries_remaining -= 1;
        } else {
            cursor.index += 1;
            cursor.retries_remaining = domain_budget;
        }
        *cursor
    }

    pub fn get(&self, chunk_id: &str) -> Option<ChunkRetryRecord> {
        self.lock().get(chunk_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every record, sorted by chunk id.
    pub fn snapshot(&self) -> Vec<(String, ChunkRetryRecord)> {
        let mut all: Vec<_> = self
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Forget every record.
    pub fn reset(&self) {
        self.lock().clear();
    }
}
