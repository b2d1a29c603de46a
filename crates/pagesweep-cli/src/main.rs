use pagesweep_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("run log unavailable, logging to stderr only: {err:#}");
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("pagesweep error: {:#}", err);
        std::process::exit(1);
    }
}
