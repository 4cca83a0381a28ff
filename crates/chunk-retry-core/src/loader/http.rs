//! libcurl-backed chunk loader.
//!
//! One blocking GET per attempt, run on the blocking pool. Any 2xx response
//! counts as a successful load; the body is optionally written under an
//! output directory, mirroring the URL path.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{ChunkLoader, ChunkPathResolver, UrlLoader};
use crate::retry::LoadError;

/// HTTP loader for the original origin and for fallback domains.
#[derive(Clone)]
pub struct CurlLoader {
    origin: String,
    public_path: String,
    resolver: Arc<dyn ChunkPathResolver>,
    output_dir: Option<PathBuf>,
    headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl CurlLoader {
    /// `origin` is scheme and authority, e.g. `https://cdn.example.com`.
    pub fn new(
        origin: impl Into<String>,
        public_path: impl Into<String>,
        resolver: Arc<dyn ChunkPathResolver>,
    ) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            public_path: public_path.into(),
            resolver,
            output_dir: None,
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Write each fetched body below `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Send each `(name, value)` pair with every request.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of `chunk_id` on the original origin.
    pub fn origin_url(&self, chunk_id: &str) -> Option<String> {
        let path = self.resolver.resolve(chunk_id)?;
        Some(format!("{}{}{}", self.origin, self.public_path, path))
    }

    async fn fetch_and_store(&self, url: String) -> Result<(), LoadError> {
        let headers = self.headers.clone();
        let timeout = self.timeout;
        let fetch_url = url.clone();
        let body = tokio::task::spawn_blocking(move || get(&fetch_url, &headers, timeout))
            .await
            .map_err(|e| LoadError::failed(format!("load task: {e}")))??;

        tracing::debug!(url = %url, bytes = body.len(), "chunk fetched");
        if let Some(dir) = &self.output_dir {
            let target = output_path(dir, &url)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &body)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkLoader for CurlLoader {
    async fn attempt_load(&self, chunk_id: &str) -> Result<(), LoadError> {
        let url = self
            .origin_url(chunk_id)
            .ok_or_else(|| LoadError::failed(format!("no source path for chunk {chunk_id}")))?;
        self.fetch_and_store(url).await
    }
}

#[async_trait]
impl UrlLoader for CurlLoader {
    async fn load_from_url(&self, url: &str) -> Result<(), LoadError> {
        self.fetch_and_store(url.to_string()).await
    }
}

/// Blocking GET returning the body on 2xx.
fn get(url: &str, headers: &BTreeMap<String, String>, timeout: Duration) -> Result<Vec<u8>, LoadError> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(timeout)?;

    let mut list = curl::easy::List::new();
    for (k, v) in headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !headers.is_empty() {
        easy.http_headers(list)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(LoadError::Http(code));
    }
    Ok(body)
}

/// Map a URL to a file below `dir`, dropping empty, `.` and `..` segments.
fn output_path(dir: &Path, url: &str) -> Result<PathBuf, LoadError> {
    let parsed = url::Url::parse(url).map_err(|source| LoadError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let mut target = dir.to_path_buf();
    let mut pushed = false;
    for segment in parsed.path_segments().into_iter().flatten() {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        target.push(segment);
        pushed = true;
    }
    if !pushed {
        target.push("index");
    }
    Ok(target)
}
