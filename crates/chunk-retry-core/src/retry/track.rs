//! Optional notification hook fired at retry transitions.
//!
//! Trackers observe; they never influence the retry decision.

/// Transition being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStatus {
    /// First load from the original origin failed; retry handling starts.
    FirstLoadError,
    /// A local retry against the original origin succeeded.
    CdnSuccess,
    /// A local retry against the original origin failed.
    CdnFail,
    /// A fallback-domain attempt succeeded.
    DomainSuccess,
    /// A fallback-domain attempt failed.
    DomainFail,
}

#[derive(Debug, Clone, Copy)]
pub struct ReloadEvent<'a> {
    pub status: ReloadStatus,
    /// Fallback domain for `Domain*` events; `None` for the original origin.
    pub domain: Option<&'a str>,
    pub chunk_id: &'a str,
    /// Local retry ordinal, or attempt count against `domain`.
    pub retries: u32,
}

pub trait ReloadTracker: Send + Sync {
    fn track(&self, event: &ReloadEvent<'_>);
}

impl<F> ReloadTracker for F
where
    F: Fn(&ReloadEvent<'_>) + Send + Sync,
{
    fn track(&self, event: &ReloadEvent<'_>) {
        self(event)
    }
}

/// Tracker that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

impl ReloadTracker for NoopTracker {
    fn track(&self, _event: &ReloadEvent<'_>) {}
}

/// Tracker that writes every event as a `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracker;

impl ReloadTracker for LogTracker {
    fn track(&self, e: &ReloadEvent<'_>) {
        let domain = e.domain.unwrap_or("origin");
        match e.status {
            ReloadStatus::FirstLoadError => {
                tracing::info!(chunk = e.chunk_id, "[first-load-error]");
            }
            ReloadStatus::CdnSuccess => {
                tracing::info!(chunk = e.chunk_id, retries = e.retries, "[cdn-success]");
            }
            ReloadStatus::CdnFail => {
                tracing::info!(chunk = e.chunk_id, retries = e.retries, "[cdn-fail]");
            }
            ReloadStatus::DomainSuccess => {
                tracing::info!(chunk = e.chunk_id, domain, retries = e.retries, "[domain-success]");
            }
            ReloadStatus::DomainFail => {
                tracing::info!(chunk = e.chunk_id, domain, retries = e.retries, "[domain-fail]");
            }
        }
    }
}
