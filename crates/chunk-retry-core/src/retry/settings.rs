//! Normalized, immutable retry settings.

use std::collections::HashSet;
use std::time::Duration;

use super::error::LoadError;
use super::policy::{DelayPolicy, RetryBudget};
use crate::config::RetryConfig;

/// Settings the controllers run against. Built once; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// Local retries against the original origin (≥ 1).
    pub max_retries: u32,
    pub delay: DelayPolicy,
    /// Ordered fallback domains; empty disables failover.
    pub fallback_domains: Vec<String>,
    /// Attempts per fallback domain (≥ 1).
    pub domain_max_retries: u32,
    /// If set, only these chunk ids get retry handling.
    pub chunk_filter: Option<HashSet<String>>,
    /// Public base path inserted between domain and source path, e.g. `/static/`.
    pub public_path: String,
    /// Scheme for fallback URLs.
    pub fallback_scheme: String,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: DelayPolicy::default(),
            fallback_domains: Vec::new(),
            domain_max_retries: 1,
            chunk_filter: None,
            public_path: String::from("/"),
            fallback_scheme: String::from("https"),
        }
    }
}

impl RetrySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_retries: cfg.max_retries.get(),
            delay: cfg.retry_delay.into(),
            fallback_domains: cfg.fallback_domains.clone(),
            domain_max_retries: cfg.fallback_domain_max_retries.get(),
            chunk_filter: cfg.chunks.as_ref().map(|c| c.iter().cloned().collect()),
            public_path: cfg.public_path.clone(),
            fallback_scheme: cfg.fallback_scheme.clone(),
        }
    }

    /// Normalizes like the config file: non-positive means 1.
    pub fn with_max_retries(mut self, n: i64) -> Self {
        self.max_retries = RetryBudget::new(n).get();
        self
    }

    pub fn with_delay(mut self, delay: DelayPolicy) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_fixed_delay(self, delay: Duration) -> Self {
        self.with_delay(DelayPolicy::fixed(delay))
    }

    pub fn with_fallback_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_domain_max_retries(mut self, n: i64) -> Self {
        self.domain_max_retries = RetryBudget::new(n).get();
        self
    }

    pub fn with_chunk_filter<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunk_filter = Some(chunks.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = public_path.into();
        self
    }

    pub fn with_fallback_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.fallback_scheme = scheme.into();
        self
    }

    /// Whether `chunk_id` receives retry handling.
    pub fn applies_to(&self, chunk_id: &str) -> bool {
        self.chunk_filter
            .as_ref()
            .map_or(true, |allowed| allowed.contains(chunk_id))
    }

    pub fn failover_enabled(&self) -> bool {
        !self.fallback_domains.is_empty()
    }

    /// `<scheme>://<domain><public_path><source_path>`.
    pub fn fallback_url(&self, domain: &str, source_path: &str) -> Result<url::Url, LoadError> {
        let raw = format!(
            "{}://{}{}{}",
            self.fallback_scheme, domain, self.public_path, source_path
        );
        url::Url::parse(&raw).map_err(|source| LoadError::InvalidUrl { url: raw, source })
    }
}
