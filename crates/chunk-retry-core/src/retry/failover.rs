//! Ordered failover across fallback domains.
//!
//! Each domain gets `domain_max_retries` immediate attempts. The cursor only
//! moves forward, so a domain is never revisited once passed.

use super::error::{ChunkLoadError, LoadError};
use super::track::ReloadStatus;
use super::{report, Episode};

pub(crate) async fn load_from_fallbacks(
    ep: &Episode<'_>,
    chunk_id: &str,
    source_path: &str,
    mut last_error: LoadError,
) -> Result<(), ChunkLoadError> {
    let settings = ep.settings;
    let budget = settings.domain_max_retries;
    let mut cursor = ep.store.enter_failover(chunk_id, budget);

    loop {
        let Some(domain) = settings.fallback_domains.get(cursor.index).map(String::as_str) else {
            return Err(report::fallback_exhausted(
                chunk_id,
                settings.max_retries,
                settings.fallback_domains.len(),
                source_path,
                last_error,
            ));
        };
        let attempt = budget.saturating_sub(cursor.retries_remaining) + 1;

        let result = match settings.fallback_url(domain, source_path) {
            Ok(url) => {
                tracing::debug!(chunk = chunk_id, domain = %domain, attempt, url = %url, "trying fallback domain");
                ep.fallback.load_from_url(url.as_str()).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                ep.track(ReloadStatus::DomainSuccess, Some(domain), chunk_id, attempt);
                tracing::info!(chunk = chunk_id, domain = %domain, attempt, "chunk loaded from fallback domain");
                return Ok(());
            }
            Err(e) => {
                ep.track(ReloadStatus::DomainFail, Some(domain), chunk_id, attempt);
                tracing::debug!(chunk = chunk_id, domain = %domain, attempt, error = %e, "fallback attempt failed");
                last_error = e;
                cursor = ep.store.record_domain_failure(chunk_id, budget);
            }
        }
    }
}
