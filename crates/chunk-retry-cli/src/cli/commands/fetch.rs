//! `chunk-retry fetch <chunk>...` – load chunks through the retry runtime.

use anyhow::{Context, Result};
use chunk_retry_core::config::RetryConfig;
use chunk_retry_core::loader::{ChunkPathResolver, CurlLoader, ManifestResolver, TemplateResolver};
use chunk_retry_core::retry::{DelaySetting, LogTracker, RetryBudget};
use chunk_retry_core::{RetryRuntime, RetrySettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cli::FetchArgs;

/// Fold command-line overrides into the loaded config.
pub(crate) fn apply_overrides(cfg: &mut RetryConfig, args: &FetchArgs) {
    if let Some(origin) = &args.origin {
        cfg.origin = Some(origin.clone());
    }
    if !args.fallback_domains.is_empty() {
        cfg.fallback_domains = args.fallback_domains.clone();
    }
    if let Some(n) = args.max_retries {
        cfg.max_retries = RetryBudget::new(n);
    }
    if let Some(n) = args.domain_max_retries {
        cfg.fallback_domain_max_retries = RetryBudget::new(n);
    }
    if let Some(ms) = args.delay_ms {
        cfg.retry_delay = DelaySetting::Fixed(ms);
    }
    if let Some(public_path) = &args.public_path {
        cfg.public_path = public_path.clone();
    }
    cfg.headers.extend(args.headers.iter().cloned());
}

fn build_resolver(cfg: &RetryConfig, args: &FetchArgs) -> Result<Arc<dyn ChunkPathResolver>> {
    let template = TemplateResolver::new(cfg.chunk_filename.clone());
    let Some(path) = &args.manifest else {
        return Ok(Arc::new(template));
    };
    let manifest = ManifestResolver::from_path(path)?;
    tracing::debug!(entries = manifest.len(), "loaded chunk manifest");
    Ok(Arc::new(move |id: &str| {
        manifest.resolve(id).or_else(|| template.resolve(id))
    }))
}

pub async fn run_fetch(mut cfg: RetryConfig, args: &FetchArgs) -> Result<()> {
    apply_overrides(&mut cfg, args);
    let origin = cfg
        .origin
        .clone()
        .context("no origin: pass --origin or set `origin` in config.toml")?;

    let resolver = build_resolver(&cfg, args)?;
    let mut loader = CurlLoader::new(origin, cfg.public_path.clone(), Arc::clone(&resolver))
        .with_timeout(Duration::from_secs(cfg.request_timeout_secs.max(1)))
        .with_headers(cfg.headers.clone());
    if let Some(out) = &args.out {
        loader = loader.with_output_dir(out);
    }

    let runtime = Arc::new(
        RetryRuntime::with_curl(RetrySettings::from_config(&cfg), loader, resolver)
            .with_tracker(Arc::new(LogTracker)),
    );
    let settings = runtime.settings();
    tracing::info!(
        chunks = args.chunks.len(),
        max_retries = settings.max_retries,
        fallback_domains = settings.fallback_domains.len(),
        headers = cfg.headers.len(),
        "fetching chunks"
    );

    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();
    for (idx, chunk_id) in args.chunks.iter().enumerate() {
        let runtime = Arc::clone(&runtime);
        let permits = Arc::clone(&permits);
        let chunk_id = chunk_id.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = runtime.ensure_chunk(&chunk_id).await;
            (idx, chunk_id, result)
        });
    }

    let mut outcomes = Vec::with_capacity(args.chunks.len());
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.context("fetch task join")?);
    }
    outcomes.sort_by_key(|(idx, _, _)| *idx);

    let mut failed = 0usize;
    for (_, chunk_id, result) in &outcomes {
        match result {
            Ok(()) => println!("ok      {}", chunk_id),
            Err(e) => {
                failed += 1;
                tracing::debug!(chunk = %chunk_id, cause = %e.last_error(), "chunk failed");
                println!("FAILED  {}: {}", chunk_id, e.to_string().replace('\n', " "));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} chunk(s) failed to load", failed, outcomes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, CliCommand};
    use clap::Parser;

    fn fetch_args(argv: &[&str]) -> FetchArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            CliCommand::Fetch(args) => args,
            _ => panic!("expected Fetch"),
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut cfg = RetryConfig::default();
        cfg.fallback_domains = vec!["from-config.example".into()];
        let args = fetch_args(&[
            "chunk-retry",
            "fetch",
            "main",
            "--origin",
            "https://cdn.example.com",
            "--fallback-domain",
            "a.example",
            "--fallback-domain",
            "b.example",
            "--max-retries",
            "3",
            "--delay-ms",
            "250",
        ]);

        apply_overrides(&mut cfg, &args);

        assert_eq!(cfg.origin.as_deref(), Some("https://cdn.example.com"));
        assert_eq!(cfg.fallback_domains, vec!["a.example", "b.example"]);
        assert_eq!(cfg.max_retries.get(), 3);
        assert_eq!(cfg.retry_delay, DelaySetting::Fixed(250));
    }

    #[test]
    fn header_flags_extend_and_override_config_headers() {
        let mut cfg = RetryConfig::default();
        cfg.headers.insert("Authorization".into(), "Bearer old".into());
        cfg.headers.insert("X-Team".into(), "web".into());
        let args = fetch_args(&[
            "chunk-retry",
            "fetch",
            "main",
            "-H",
            "Authorization: Bearer new",
            "--header",
            "X-Build:7",
        ]);

        apply_overrides(&mut cfg, &args);

        assert_eq!(cfg.headers.get("Authorization").map(String::as_str), Some("Bearer new"));
        assert_eq!(cfg.headers.get("X-Team").map(String::as_str), Some("web"));
        assert_eq!(cfg.headers.get("X-Build").map(String::as_str), Some("7"));
    }

    #[test]
    fn negative_override_normalizes() {
        let mut cfg = RetryConfig::default();
        let args = fetch_args(&["chunk-retry", "fetch", "main", "--max-retries", "-2"]);
        apply_overrides(&mut cfg, &args);
        assert_eq!(cfg.max_retries.get(), 1);
    }

    #[test]
    fn manifest_entries_win_over_template() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("chunks.json");
        std::fs::write(&manifest, r#"{"main": "js/main.abc.js"}"#).unwrap();
        let mut cfg = RetryConfig::default();
        cfg.chunk_filename = "js/[id].chunk.js".into();
        let manifest_arg = manifest.to_str().unwrap();
        let args = fetch_args(&["chunk-retry", "fetch", "main", "--manifest", manifest_arg]);

        let resolver = build_resolver(&cfg, &args).unwrap();

        assert_eq!(resolver.resolve("main").as_deref(), Some("js/main.abc.js"));
        assert_eq!(resolver.resolve("7").as_deref(), Some("js/7.chunk.js"));
    }

    #[tokio::test]
    async fn missing_origin_is_an_error() {
        let args = fetch_args(&["chunk-retry", "fetch", "main"]);
        let err = run_fetch(RetryConfig::default(), &args).await.unwrap_err();
        assert!(err.to_string().contains("no origin"));
    }
}
