//! Builds the terminal failure once every retry option is gone.

use super::error::{ChunkLoadError, LoadError};

/// Local retries exhausted with no fallback domains configured.
pub fn retries_exhausted(
    chunk_id: &str,
    max_retries: u32,
    source_path: &str,
    last_error: LoadError,
) -> ChunkLoadError {
    tracing::warn!(
        chunk = chunk_id,
        max_retries,
        path = source_path,
        error = %last_error,
        "chunk load failed permanently"
    );
    ChunkLoadError::RetriesExhausted {
        chunk_id: chunk_id.to_string(),
        max_retries,
        source_path: source_path.to_string(),
        last_error,
    }
}

/// Every configured fallback domain failed for this chunk.
pub fn fallback_exhausted(
    chunk_id: &str,
    max_retries: u32,
    domains: usize,
    source_path: &str,
    last_error: LoadError,
) -> ChunkLoadError {
    tracing::warn!(
        chunk = chunk_id,
        max_retries,
        domains,
        path = source_path,
        error = %last_error,
        "chunk load failed on every fallback domain"
    );
    ChunkLoadError::FallbackExhausted {
        chunk_id: chunk_id.to_string(),
        max_retries,
        domains,
        source_path: source_path.to_string(),
        last_error,
    }
}
