//! Retry coordination service.
//!
//! [`RetryRuntime`] owns the process-wide retry records and wraps the host's
//! load primitives. It is created once per process (or per test) and shared
//! by reference or `Arc`; records are never torn down, only reset explicitly.

mod guard;

use std::sync::Arc;

use crate::loader::{ChunkLoader, ChunkPathResolver, CurlLoader, UrlLoader};
use crate::retry::{
    ChunkLoadError, Episode, NoopTracker, ReloadTracker, RetrySettings, RetryStateStore,
};
use guard::ChunkLocks;

pub struct RetryRuntime {
    settings: RetrySettings,
    loader: Arc<dyn ChunkLoader>,
    fallback: Arc<dyn UrlLoader>,
    resolver: Arc<dyn ChunkPathResolver>,
    tracker: Arc<dyn ReloadTracker>,
    store: RetryStateStore,
    locks: ChunkLocks,
}

impl RetryRuntime {
    pub fn new(
        settings: RetrySettings,
        loader: Arc<dyn ChunkLoader>,
        fallback: Arc<dyn UrlLoader>,
        resolver: Arc<dyn ChunkPathResolver>,
    ) -> Self {
        Self {
            settings,
            loader,
            fallback,
            resolver,
            tracker: Arc::new(NoopTracker),
            store: RetryStateStore::new(),
            locks: ChunkLocks::default(),
        }
    }

    /// Runtime using one [`CurlLoader`] for the origin and every fallback domain.
    pub fn with_curl(
        settings: RetrySettings,
        loader: CurlLoader,
        resolver: Arc<dyn ChunkPathResolver>,
    ) -> Self {
        let loader = Arc::new(loader);
        Self::new(settings, loader.clone(), loader, resolver)
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn ReloadTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn settings(&self) -> &RetrySettings {
        &self.settings
    }

    /// Retry records, for inspection and test resets.
    pub fn state(&self) -> &RetryStateStore {
        &self.store
    }

    /// Load `chunk_id`, absorbing transient failures.
    ///
    /// Resolves like a first-try success once any attempt succeeds. Concurrent
    /// calls for the same chunk run one after another; different chunks run
    /// independently.
    pub async fn ensure_chunk(&self, chunk_id: &str) -> Result<(), ChunkLoadError> {
        let _guard = self.locks.acquire(chunk_id).await;
        let ep = Episode {
            settings: &self.settings,
            store: &self.store,
            loader: self.loader.as_ref(),
            fallback: self.fallback.as_ref(),
            resolver: self.resolver.as_ref(),
            tracker: self.tracker.as_ref(),
        };
        ep.run(chunk_id).await
    }
}

impl std::fmt::Debug for RetryRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryRuntime")
            .field("settings", &self.settings)
            .field("records", &self.store.len())
            .finish()
    }
}
