//! Chunk-load retry and fallback-domain failover.
//!
//! A failed chunk load first goes through delayed local retries against the
//! original origin ([`local`]). When that budget is spent the chunk either
//! fails with a descriptive error ([`report`]) or walks the ordered list of
//! fallback domains ([`failover`]). Per-chunk budgets live in
//! [`RetryStateStore`].

mod error;
mod failover;
mod local;
mod policy;
mod report;
mod settings;
mod state;
mod track;

#[cfg(test)]
mod testing;

pub use error::{ChunkLoadError, LoadError};
pub use policy::{DelayFormula, DelayPolicy, DelaySetting, RetryBudget};
pub use settings::RetrySettings;
pub use state::{ChunkRetryRecord, DomainCursor, RetryStateStore};
pub use track::{LogTracker, NoopTracker, ReloadEvent, ReloadStatus, ReloadTracker};

use crate::loader::{ChunkLoader, ChunkPathResolver, UrlLoader};

/// Everything one retry episode needs, borrowed from the runtime.
pub(crate) struct Episode<'a> {
    pub settings: &'a RetrySettings,
    pub store: &'a RetryStateStore,
    pub loader: &'a dyn ChunkLoader,
    pub fallback: &'a dyn UrlLoader,
    pub resolver: &'a dyn ChunkPathResolver,
    pub tracker: &'a dyn ReloadTracker,
}

impl Episode<'_> {
    fn track(&self, status: ReloadStatus, domain: Option<&str>, chunk_id: &str, retries: u32) {
        self.tracker.track(&ReloadEvent {
            status,
            domain,
            chunk_id,
            retries,
        });
    }

    pub(crate) async fn run(&self, chunk_id: &str) -> Result<(), ChunkLoadError> {
        local::load_with_retry(self, chunk_id).await
    }
}
