//! Load failures reported by host primitives and the terminal retry errors.

use thiserror::Error;

/// Failure of a single load attempt (original origin or fallback domain).
///
/// The retry logic treats every variant the same way: as an opaque failure.
/// The variants only exist so logs and terminal errors say what went wrong.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Curl reported an error (timeout, connection, DNS, etc.).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// Response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Writing the fetched chunk to disk failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// A composed fallback URL did not parse.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// Host-defined failure (script error event, custom loader, tests).
    #[error("{0}")]
    Failed(String),
}

impl LoadError {
    pub fn failed(msg: impl Into<String>) -> Self {
        LoadError::Failed(msg.into())
    }
}

/// Terminal outcome of `ensure_chunk`.
#[derive(Debug, Error)]
pub enum ChunkLoadError {
    /// Chunk is excluded from retry handling; the first failure is passed through unchanged.
    #[error(transparent)]
    Load(LoadError),
    /// Local retries exhausted and no fallback domains configured.
    #[error("Loading chunk {chunk_id} failed after {max_retries} retries.\n({source_path})")]
    RetriesExhausted {
        chunk_id: String,
        max_retries: u32,
        source_path: String,
        #[source]
        last_error: LoadError,
    },
    /// Every fallback domain failed.
    #[error(
        "Loading chunk {chunk_id} failed after {max_retries} retries and {domains} fallback domains.\n({source_path})"
    )]
    FallbackExhausted {
        chunk_id: String,
        max_retries: u32,
        domains: usize,
        source_path: String,
        #[source]
        last_error: LoadError,
    },
    /// The host could not map the chunk id to a source path.
    #[error("cannot resolve source path for chunk {chunk_id}")]
    UnknownChunk {
        chunk_id: String,
        #[source]
        last_error: LoadError,
    },
}

impl ChunkLoadError {
    /// Chunk id this error is about, when known.
    pub fn chunk_id(&self) -> Option<&str> {
        match self {
            ChunkLoadError::Load(_) => None,
            ChunkLoadError::RetriesExhausted { chunk_id, .. }
            | ChunkLoadError::FallbackExhausted { chunk_id, .. }
            | ChunkLoadError::UnknownChunk { chunk_id, .. } => Some(chunk_id),
        }
    }

    /// The load failure that ended the episode.
    pub fn last_error(&self) -> &LoadError {
        match self {
            ChunkLoadError::Load(e) => e,
            ChunkLoadError::RetriesExhausted { last_error, .. }
            | ChunkLoadError::FallbackExhausted { last_error, .. }
            | ChunkLoadError::UnknownChunk { last_error, .. } => last_error,
        }
    }
}
