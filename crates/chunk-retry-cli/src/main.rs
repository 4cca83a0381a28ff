use chunk_retry_core::logging::{self, LogTarget};
use clap::Parser;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible.
    let target = if cli.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::StateFile
    };
    logging::init(target, cli.verbose);

    if let Err(err) = cli.run().await {
        eprintln!("chunk-retry error: {:#}", err);
        std::process::exit(1);
    }
}
