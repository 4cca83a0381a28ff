//! Scripted host primitives for controller tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::Instant;

use super::{ChunkLoadError, Episode, LoadError, ReloadEvent, ReloadStatus, ReloadTracker};
use super::{RetrySettings, RetryStateStore};
use crate::loader::{ChunkLoader, UrlLoader};

/// Origin behaviour: fail the first `n` attempts per chunk, then succeed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Script {
    fail_first: Option<usize>,
}

impl Script {
    pub fn always_fail() -> Self {
        Self { fail_first: None }
    }

    pub fn succeed_after(failures: usize) -> Self {
        Self {
            fail_first: Some(failures),
        }
    }
}

pub(crate) struct ScriptedOrigin {
    script: Script,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl ScriptedOrigin {
    pub fn calls(&self, chunk_id: &str) -> usize {
        self.attempt_times(chunk_id).len()
    }

    pub fn attempt_times(&self, chunk_id: &str) -> Vec<Instant> {
        self.attempts
            .lock()
            .unwrap()
            .get(chunk_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChunkLoader for ScriptedOrigin {
    async fn attempt_load(&self, chunk_id: &str) -> Result<(), LoadError> {
        let n = {
            let mut attempts = self.attempts.lock().unwrap();
            let times = attempts.entry(chunk_id.to_string()).or_default();
            times.push(Instant::now());
            times.len()
        };
        match self.script.fail_first {
            Some(limit) if n > limit => Ok(()),
            _ => Err(LoadError::Http(503)),
        }
    }
}

/// Fallback behaviour per host: fail `n` times then succeed; unknown hosts always fail.
#[derive(Debug, Clone, Default)]
pub(crate) struct FallbackScript {
    succeed_after: HashMap<String, usize>,
}

impl FallbackScript {
    pub fn always_fail() -> Self {
        Self::default()
    }

    pub fn succeed_on(mut self, host: &str, failures: usize) -> Self {
        self.succeed_after.insert(host.to_string(), failures);
        self
    }
}

pub(crate) struct ScriptedFallback {
    script: FallbackScript,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFallback {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrlLoader for ScriptedFallback {
    async fn load_from_url(&self, url: &str) -> Result<(), LoadError> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let seen = {
            let mut urls = self.urls.lock().unwrap();
            urls.push(url.to_string());
            urls.iter().filter(|u| u.contains(&host)).count()
        };
        match self.script.succeed_after.get(&host) {
            Some(&failures) if seen > failures => Ok(()),
            _ => Err(LoadError::failed(format!("error event from {host}"))),
        }
    }
}

#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<(ReloadStatus, Option<String>, u32)>>,
}

impl ReloadTracker for Recorder {
    fn track(&self, e: &ReloadEvent<'_>) {
        self.events
            .lock()
            .unwrap()
            .push((e.status, e.domain.map(str::to_string), e.retries));
    }
}

/// Settings plus scripted primitives, driven through the local controller.
pub(crate) struct Harness {
    pub settings: RetrySettings,
    pub store: RetryStateStore,
    pub origin: ScriptedOrigin,
    pub fallback: ScriptedFallback,
    pub recorder: Recorder,
}

impl Harness {
    pub fn new(settings: RetrySettings, origin: Script) -> Self {
        Self::with_fallback(settings, origin, FallbackScript::always_fail())
    }

    pub fn with_fallback(settings: RetrySettings, origin: Script, fallback: FallbackScript) -> Self {
        Self {
            settings,
            store: RetryStateStore::new(),
            origin: ScriptedOrigin {
                script: origin,
                attempts: Mutex::default(),
            },
            fallback: ScriptedFallback {
                script: fallback,
                urls: Mutex::default(),
            },
            recorder: Recorder::default(),
        }
    }

    pub async fn run(&self, chunk_id: &str) -> Result<(), ChunkLoadError> {
        let resolver = |id: &str| (id != "missing").then(|| format!("js/{id}.js"));
        let ep = Episode {
            settings: &self.settings,
            store: &self.store,
            loader: &self.origin,
            fallback: &self.fallback,
            resolver: &resolver,
            tracker: &self.recorder,
        };
        super::local::load_with_retry(&ep, chunk_id).await
    }

    pub fn events(&self) -> Vec<(ReloadStatus, Option<String>, u32)> {
        self.recorder.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<ReloadStatus> {
        self.events().into_iter().map(|e| e.0).collect()
    }
}
