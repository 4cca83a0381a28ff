//! `chunk-retry config` – print the effective configuration.

use anyhow::Result;
use chunk_retry_core::config::RetryConfig;
use chunk_retry_core::RetrySettings;
use std::path::Path;

pub fn run_config(cfg: &RetryConfig, path: &Path) -> Result<()> {
    let settings = RetrySettings::from_config(cfg);
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    println!();
    println!(
        "# effective: {} local retries, {} attempt(s) per fallback domain, {} fallback domain(s)",
        settings.max_retries,
        settings.domain_max_retries,
        settings.fallback_domains.len()
    );
    Ok(())
}
