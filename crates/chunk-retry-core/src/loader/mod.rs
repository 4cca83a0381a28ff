//! Host primitives the retry runtime wraps.
//!
//! A host supplies three things: a way to load a chunk from its original
//! origin, a way to load an arbitrary URL (used for fallback domains), and a
//! mapping from chunk id to the chunk's relative source path.

mod http;
mod resolve;

use async_trait::async_trait;

use crate::retry::LoadError;

pub use http::CurlLoader;
pub use resolve::{ManifestResolver, TemplateResolver};

/// The host's original chunk-load primitive.
#[async_trait]
pub trait ChunkLoader: Send + Sync {
    async fn attempt_load(&self, chunk_id: &str) -> Result<(), LoadError>;
}

/// The host's load-from-URL primitive, used against fallback domains.
#[async_trait]
pub trait UrlLoader: Send + Sync {
    async fn load_from_url(&self, url: &str) -> Result<(), LoadError>;
}

/// Maps a chunk id to its canonical relative source path (e.g. `js/42.3f2a.js`).
pub trait ChunkPathResolver: Send + Sync {
    fn resolve(&self, chunk_id: &str) -> Option<String>;
}

impl<F> ChunkPathResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn resolve(&self, chunk_id: &str) -> Option<String> {
        self(chunk_id)
    }
}
