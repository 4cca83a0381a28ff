//! CLI command handlers, one per file.

mod config;
mod docs;
mod fetch;

pub use config::run_config;
pub use docs::{run_completions, run_man};
pub use fetch::run_fetch;
