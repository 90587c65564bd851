//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// recast -- recreate running containers and compose projects from newer images.
///
/// Use `recast <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "recast", version, about, long_about = None)]
pub struct Cli {
    /// Path to the recast.toml configuration file (default: /etc/recast/recast.toml).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one reconciliation pass over compose projects and standalone containers.
    Run(RunArgs),

    /// Inspect configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Flags override the configuration file and `RECAST_*` environment variables.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Record what would change without touching anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Keep dangling images after the run.
    #[arg(long)]
    pub no_prune: bool,

    /// Only refresh compose projects.
    #[arg(long, conflicts_with = "standalone_only")]
    pub compose_only: bool,

    /// Only recreate containers that are not part of a compose project.
    #[arg(long)]
    pub standalone_only: bool,

    /// Pull every tag of the repository instead of pinning the container's platform.
    #[arg(long)]
    pub pull_all_platforms: bool,

    /// Container names to process (comma, semicolon or space separated).
    #[arg(long, value_name = "NAMES")]
    pub only_containers: Option<String>,

    /// Container names to leave alone.
    #[arg(long, value_name = "NAMES")]
    pub exclude_containers: Option<String>,

    /// Compose project names to process.
    #[arg(long, value_name = "NAMES")]
    pub only_projects: Option<String>,

    /// Compose project names to leave alone.
    #[arg(long, value_name = "NAMES")]
    pub exclude_projects: Option<String>,

    /// Seconds to wait for a graceful stop before the daemon kills the container.
    #[arg(long, value_name = "SECS")]
    pub stop_timeout: Option<u64>,

    /// Append log lines to this file as well as stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Directory for backup records.
    #[arg(long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,
}

// ---- config ----

/// Inspect recast configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, docker, run, filters).
        #[arg(long)]
        section: Option<String>,
    },
}
