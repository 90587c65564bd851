//! recast -- recreate running containers and compose projects from newer images.

use std::process::ExitCode;

use clap::Parser;

use recast_cli::cli::Cli;
use recast_cli::commands;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match commands::dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "recast failed");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
