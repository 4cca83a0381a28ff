//! Logging init: file under the XDG state dir, or stderr.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,chunk_retry_core=debug,chunk_retry=debug";
/// Filter used for `--verbose` when `RUST_LOG` is unset.
const VERBOSE_FILTER: &str = "debug,chunk_retry_core=trace,chunk_retry=trace";

/// Where log records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// `~/.local/state/chunk-retry/chunk-retry.log`, falling back to stderr.
    #[default]
    StateFile,
    Stderr,
}

/// Writer that is either a file or stderr (used when a file clone fails).
enum FileOrStderr {
    File(fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct FileMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    })
}

pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunk-retry")?;
    Ok(xdg_dirs.get_state_home().join("chunk-retry.log"))
}

fn open_log_file() -> Result<(fs::File, PathBuf)> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    Ok((file, path))
}

/// Install the global subscriber.
///
/// With [`LogTarget::StateFile`], an unwritable state dir degrades to stderr
/// instead of failing; the reason is logged once the subscriber is up.
pub fn init(target: LogTarget, verbose: bool) {
    let (writer, opened): (BoxMakeWriter, Result<PathBuf>) = match target {
        LogTarget::Stderr => (BoxMakeWriter::new(io::stderr), Ok(PathBuf::new())),
        LogTarget::StateFile => match open_log_file() {
            Ok((file, path)) => (BoxMakeWriter::new(FileMakeWriter(file)), Ok(path)),
            Err(e) => (BoxMakeWriter::new(io::stderr), Err(e)),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    match (target, opened) {
        (LogTarget::StateFile, Ok(path)) => {
            tracing::info!("chunk-retry logging initialized at {}", path.display());
        }
        (LogTarget::StateFile, Err(e)) => {
            tracing::warn!("file logging unavailable, using stderr: {:#}", e);
        }
        (LogTarget::Stderr, _) => {}
    }
}
