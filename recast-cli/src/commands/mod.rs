//! Command handlers -- one module per subcommand

pub mod config;
pub mod run;

use std::path::PathBuf;

use recast_core::config::DEFAULT_CONFIG_PATH;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Dispatch a parsed command line to its handler.
pub async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    match cli.command {
        Commands::Run(args) => {
            let config =
                run::resolve_config(&args, &config_path, explicit, cli.log_level.as_deref())
                    .await?;
            run::execute(config, &writer).await
        }
        Commands::Config(args) => {
            config::execute(args, &config_path, explicit, cli.log_level.as_deref(), &writer).await
        }
    }
}
