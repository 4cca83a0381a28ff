//! Delayed retries against the chunk's original origin.

use super::error::{ChunkLoadError, LoadError};
use super::track::ReloadStatus;
use super::{failover, report, Episode};

/// Load `chunk_id`, retrying on the original origin until the local budget is
/// spent, then escalating to failover or a terminal failure.
///
/// Attempts are strictly sequential: the next one starts only after the
/// previous one failed and its delay elapsed.
pub(crate) async fn load_with_retry(
    ep: &Episode<'_>,
    chunk_id: &str,
) -> Result<(), ChunkLoadError> {
    let settings = ep.settings;
    let mut ordinal: Option<u32> = None;

    loop {
        let err = match ep.loader.attempt_load(chunk_id).await {
            Ok(()) => {
                if let Some(n) = ordinal {
                    ep.track(ReloadStatus::CdnSuccess, None, chunk_id, n);
                    tracing::info!(chunk = chunk_id, retry = n, "chunk loaded on retry");
                }
                return Ok(());
            }
            Err(e) => e,
        };

        if !settings.applies_to(chunk_id) {
            return Err(ChunkLoadError::Load(err));
        }

        match ordinal {
            None => ep.track(ReloadStatus::FirstLoadError, None, chunk_id, 0),
            Some(n) => ep.track(ReloadStatus::CdnFail, None, chunk_id, n),
        }

        match ep.store.take_local_retry(chunk_id, settings.max_retries) {
            Some(next) => {
                let delay = settings.delay.delay_for(next);
                tracing::debug!(
                    chunk = chunk_id,
                    retry = next,
                    max_retries = settings.max_retries,
                    delay = ?delay,
                    error = %err,
                    "chunk load failed; retrying"
                );
                tokio::time::sleep(delay).await;
                ordinal = Some(next);
            }
            None => return escalate(ep, chunk_id, err).await,
        }
    }
}

/// Local budget spent: fail, or hand over to the fallback domains.
async fn escalate(
    ep: &Episode<'_>,
    chunk_id: &str,
    last_error: LoadError,
) -> Result<(), ChunkLoadError> {
    let settings = ep.settings;
    let Some(source_path) = ep.resolver.resolve(chunk_id) else {
        return Err(ChunkLoadError::UnknownChunk {
            chunk_id: chunk_id.to_string(),
            last_error,
        });
    };

    if !settings.failover_enabled() {
        return Err(report::retries_exhausted(
            chunk_id,
            settings.max_retries,
            &source_path,
            last_error,
        ));
    }

    // A cursor left past the last domain by an earlier episode fails without waiting.
    let list_exhausted = ep
        .store
        .get(chunk_id)
        .and_then(|record| record.failover)
        .is_some_and(|cursor| cursor.index >= settings.fallback_domains.len());
    if !list_exhausted {
        let delay = settings.delay.delay_for(settings.max_retries.saturating_add(1));
        tracing::info!(
            chunk = chunk_id,
            domains = settings.fallback_domains.len(),
            delay = ?delay,
            "local retries exhausted; switching to fallback domains"
        );
        tokio::time::sleep(delay).await;
    }
    failover::load_from_fallbacks(ep, chunk_id, &source_path, last_error).await
}
