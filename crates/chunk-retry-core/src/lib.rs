//! Chunk-load retry with ordered fallback-domain failover.
//!
//! Hosts plug their load primitives into [`runtime::RetryRuntime`] and call
//! [`runtime::RetryRuntime::ensure_chunk`] instead of loading chunks directly.

pub mod config;
pub mod loader;
pub mod logging;
pub mod retry;
pub mod runtime;

pub use retry::{ChunkLoadError, LoadError, RetrySettings};
pub use runtime::RetryRuntime;
