use dsfetch_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    let sink = logging::init();
    tracing::debug!(?sink, "logging initialized");

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("dsfetch error: {:#}", err);
        std::process::exit(1);
    }
}
