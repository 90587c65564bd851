//! `recast run` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use recast_core::config::RecastConfig;
use recast_core::error::RecastError;
use recast_core::filter::NameList;
use recast_core::outcome::{Outcome, RunReport};
use recast_runtime::{BollardDockerClient, CliComposeRunner};

use crate::cli::RunArgs;
use crate::driver::Reconciler;
use crate::error::CliError;
use crate::lock::RunLock;
use crate::logging;
use crate::output::{OutputWriter, Render};

/// Build the effective configuration for a run.
///
/// Order of precedence, lowest first: defaults, config file, `RECAST_*`
/// environment variables, `--log-level`, run flags. The merged result is
/// validated once more after the flags are applied.
///
/// # Errors
///
/// Returns `CliError::Core` if the file cannot be read or the merged
/// configuration is invalid.
pub async fn resolve_config(
    args: &RunArgs,
    config_path: &Path,
    explicit: bool,
    log_level: Option<&str>,
) -> Result<RecastConfig, CliError> {
    let mut config = RecastConfig::load_or_default(config_path, explicit).await?;
    if let Some(level) = log_level {
        config.general.log_level = level.to_owned();
    }
    apply_flags(args, &mut config);
    config.validate()?;
    Ok(config)
}

/// Overlay run flags on a loaded configuration.
pub fn apply_flags(args: &RunArgs, config: &mut RecastConfig) {
    let run = &mut config.run;
    run.dry_run |= args.dry_run;
    run.pull_all_platforms |= args.pull_all_platforms;
    if args.no_prune {
        run.prune_images = false;
    }
    if args.compose_only {
        run.compose_only = true;
        run.standalone_only = false;
    }
    if args.standalone_only {
        run.standalone_only = true;
        run.compose_only = false;
    }
    if let Some(secs) = args.stop_timeout {
        run.stop_timeout_secs = secs;
    }

    if let Some(path) = &args.log_file {
        config.general.log_file = Some(path.clone());
    }
    if let Some(dir) = &args.backup_dir {
        config.general.backup_dir = dir.clone();
    }

    let filters = &mut config.filters;
    let overrides = [
        (&args.only_containers, &mut filters.only_containers),
        (&args.exclude_containers, &mut filters.exclude_containers),
        (&args.only_projects, &mut filters.only_projects),
        (&args.exclude_projects, &mut filters.exclude_projects),
    ];
    for (raw, list) in overrides {
        if let Some(raw) = raw {
            *list = NameList::parse(raw);
        }
    }
}

/// Execute one reconciliation pass.
///
/// When another recast process holds the run lock this logs a single notice
/// and returns `Ok(())` without contacting the daemon.
///
/// # Errors
///
/// Fatal conditions only: logging setup, lock file IO, unreachable daemon,
/// compose missing while projects are eligible. Per-entity failures are
/// reported in the rendered [`RunReport`] and still return `Ok(())`.
pub async fn execute(config: RecastConfig, writer: &OutputWriter) -> Result<(), CliError> {
    logging::init_tracing(&config.general)?;

    let lock_path = config.general.lock_file.as_path();
    let Some(lock) = RunLock::acquire(lock_path).map_err(RecastError::from)? else {
        info!(path = %lock_path.display(), "another recast run is in progress, exiting");
        return Ok(());
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.run.dry_run,
        "recast starting"
    );

    let docker = BollardDockerClient::connect(
        config.docker.socket.as_deref(),
        config.docker.api_timeout_secs,
    )
    .map_err(RecastError::from)?;

    let command_timeout = Duration::from_secs(config.run.command_timeout_secs);
    let run_id = Uuid::new_v4().to_string();
    let report = Reconciler::new(&config, Arc::new(docker))
        .run(&run_id, || async move {
            CliComposeRunner::detect(command_timeout).await.map(Arc::new)
        })
        .await?;
    drop(lock);

    writer.render(&report)?;
    Ok(())
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let mode = if self.dry_run { " (dry-run)" } else { "" };
        writeln!(w, "Run {}{}", self.run_id.bold(), mode)?;

        if self.entities.is_empty() {
            writeln!(w, "  nothing to reconcile")?;
        }
        let width = self.entities.iter().map(|e| e.name.len()).max().unwrap_or(0);
        for entity in &self.entities {
            let detail = match &entity.outcome {
                Outcome::Recreated {
                    backup: Some(path),
                } => format!("backup: {}", path.display()),
                Outcome::Skipped(reason) | Outcome::Failed(reason) => reason.clone(),
                _ => String::new(),
            };
            let label = if detail.is_empty() {
                entity.outcome.label().to_owned()
            } else {
                format!("{:<10}", entity.outcome.label())
            };
            let label = match &entity.outcome {
                Outcome::Unchanged => label.dimmed(),
                Outcome::Recreated { .. } | Outcome::Updated => label.green(),
                Outcome::Skipped(_) => label.yellow(),
                Outcome::Failed(_) => label.red().bold(),
            };
            writeln!(
                w,
                "  {:<9} {:<width$}  {}{}",
                entity.kind.to_string(),
                entity.name,
                label,
                detail
            )?;
        }

        if !self.planned_actions.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Planned actions:".bold())?;
            for action in &self.planned_actions {
                writeln!(w, "  {action}")?;
            }
        }

        if let Some(pruned) = &self.pruned {
            writeln!(w)?;
            writeln!(
                w,
                "Pruned {} dangling image(s), {} reclaimed",
                pruned.images_deleted,
                format_bytes(pruned.space_reclaimed)
            )?;
        }

        let counts = self.counts();
        writeln!(w)?;
        writeln!(
            w,
            "Summary: {} recreated, {} updated, {} unchanged, {} skipped, {} failed",
            counts.recreated, counts.updated, counts.unchanged, counts.skipped, counts.failed
        )?;
        Ok(())
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
