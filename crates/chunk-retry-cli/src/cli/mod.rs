//! CLI for the chunk-retry loader.

mod commands;

use anyhow::Result;
use chunk_retry_core::config::{self, RetryConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_completions, run_config, run_fetch, run_man};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "chunk-retry")]
#[command(about = "Fetch bundle chunks with retries and fallback-domain failover", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/chunk-retry/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of the state-dir log file.
    #[arg(long, global = true)]
    pub log_stderr: bool,

    /// More detailed logs (ignored when RUST_LOG is set).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch chunks from the origin, retrying and failing over as configured.
    Fetch(FetchArgs),

    /// Show the effective configuration.
    Config {
        /// Print only the config file path.
        #[arg(long)]
        path: bool,
    },

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff).
    Man,
}

/// Options for `fetch`; each overrides the matching config value.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Chunk ids to load.
    #[arg(required = true, value_name = "CHUNK")]
    pub chunks: Vec<String>,

    /// Original origin, e.g. https://cdn.example.com.
    #[arg(long)]
    pub origin: Option<String>,

    /// JSON manifest mapping chunk ids to source paths.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Write fetched chunks below this directory.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Fallback domain (repeatable, tried in order).
    #[arg(long = "fallback-domain", value_name = "DOMAIN")]
    pub fallback_domains: Vec<String>,

    /// Local retries against the origin.
    #[arg(long, allow_negative_numbers = true)]
    pub max_retries: Option<i64>,

    /// Attempts per fallback domain.
    #[arg(long, allow_negative_numbers = true)]
    pub domain_max_retries: Option<i64>,

    /// Fixed delay before each local retry, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Public base path between domain and chunk path.
    #[arg(long)]
    pub public_path: Option<String>,

    /// Extra request header, `Name: value` (repeatable).
    #[arg(long = "header", short = 'H', value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Maximum chunks fetched at once.
    #[arg(long, default_value = "4", value_name = "N")]
    pub jobs: usize,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

impl Cli {
    fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(p) => Ok(p.clone()),
            None => config::config_path(),
        }
    }

    fn load_config(&self) -> Result<RetryConfig> {
        let cfg = config::load_or_init_at(&self.config_path()?)?;
        tracing::debug!("loaded config: {:?}", cfg);
        Ok(cfg)
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            CliCommand::Fetch(args) => {
                let cfg = self.load_config()?;
                run_fetch(cfg, args).await?;
            }
            CliCommand::Config { path } => {
                let cfg_path = self.config_path()?;
                if *path {
                    println!("{}", cfg_path.display());
                } else {
                    run_config(&self.load_config()?, &cfg_path)?;
                }
            }
            CliCommand::Completions { shell } => run_completions(*shell),
            CliCommand::Man => run_man()?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
