use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::{DelaySetting, RetryBudget};

/// Configuration loaded from `~/.config/chunk-retry/config.toml`.
///
/// Every field is optional in the file; missing values take the defaults
/// below. Budgets that are not positive integers normalize to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Local retries against the original origin.
    pub max_retries: RetryBudget,
    /// Delay before each local retry: milliseconds or a formula table.
    pub retry_delay: DelaySetting,
    /// Ordered fallback domains tried once local retries are exhausted.
    pub fallback_domains: Vec<String>,
    /// Attempts per fallback domain.
    pub fallback_domain_max_retries: RetryBudget,
    /// Only these chunk ids get retry handling (None = all chunks).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,
    /// Public base path placed between the domain and the chunk's source path.
    pub public_path: String,
    /// Scheme used for fallback URLs.
    pub fallback_scheme: String,
    /// Original origin chunks are served from (used by the CLI host).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Source path template for chunks without a manifest entry; `[id]` is replaced.
    pub chunk_filename: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Extra request headers sent with every chunk request.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RetryBudget::default(),
            retry_delay: DelaySetting::default(),
            fallback_domains: Vec::new(),
            fallback_domain_max_retries: RetryBudget::default(),
            chunks: None,
            public_path: String::from("/"),
            fallback_scheme: String::from("https"),
            origin: None,
            chunk_filename: String::from("[id].js"),
            request_timeout_secs: 30,
            headers: BTreeMap::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunk-retry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RetryConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Like [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<RetryConfig> {
    if !path.exists() {
        let default_cfg = RetryConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: RetryConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
