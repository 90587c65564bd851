//! Reconciliation driver.
//!
//! One pass, strictly sequential, in discovery order:
//!
//! 1. compose projects (unless `standalone_only`)
//! 2. standalone containers (unless `compose_only`)
//! 3. dangling image prune (when `prune_images`)
//!
//! Fatal conditions (unreachable daemon, missing compose while projects are
//! eligible) are detected before the first mutation. Everything after that is
//! recorded per entity in the [`RunReport`] and never aborts the pass.

use std::future::Future;
use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};

use recast_compose::ComposeRefresher;
use recast_core::action::{ActionJournal, PlannedAction};
use recast_core::config::RecastConfig;
use recast_core::error::RecastError;
use recast_core::outcome::{EntityKind, Outcome, RunReport};
use recast_core::types::{ComposeProject, ContainerSummary};
use recast_recreate::RecreationExecutor;
use recast_runtime::{ComposeRunner, DockerClient, RuntimeError, group_projects, standalone};

/// Drives one reconciliation pass against a single runtime.
pub struct Reconciler<'a, D: DockerClient> {
    config: &'a RecastConfig,
    docker: Arc<D>,
}

impl<'a, D: DockerClient> Reconciler<'a, D> {
    /// Create a driver over a fully resolved configuration.
    pub fn new(config: &'a RecastConfig, docker: Arc<D>) -> Self {
        Self { config, docker }
    }

    /// Run one pass.
    ///
    /// `detect_compose` is called at most once, and only when at least one
    /// eligible compose project is running.
    ///
    /// # Errors
    ///
    /// Returns `RecastError::Runtime` when the daemon is unreachable, the
    /// container list cannot be read, or compose is needed but missing.
    pub async fn run<R, F, Fut>(
        &self,
        run_id: &str,
        detect_compose: F,
    ) -> Result<RunReport, RecastError>
    where
        R: ComposeRunner,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<R>, RuntimeError>>,
    {
        let span = info_span!("run", run_id = %run_id, dry_run = self.config.run.dry_run);
        self.run_inner(run_id, detect_compose).instrument(span).await
    }

    async fn run_inner<R, F, Fut>(
        &self,
        run_id: &str,
        detect_compose: F,
    ) -> Result<RunReport, RecastError>
    where
        R: ComposeRunner,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<R>, RuntimeError>>,
    {
        self.docker.ping().await?;
        let containers = self.docker.list_containers().await?;
        let projects = group_projects(&containers);
        let standalone = standalone(&containers);
        info!(
            containers = containers.len(),
            projects = projects.len(),
            standalone = standalone.len(),
            "runtime state read"
        );

        let run = &self.config.run;
        let project_filter = self.config.filters.projects();

        // Detect compose before anything is changed.
        let runner = if !run.standalone_only
            && projects.iter().any(|p| project_filter.includes(&p.name))
        {
            Some(detect_compose().await?)
        } else {
            None
        };

        let mut report = RunReport::new(run_id, run.dry_run);
        let mut journal = ActionJournal::new();

        if run.standalone_only {
            info!("compose phase disabled (standalone-only)");
        } else {
            self.refresh_projects(&projects, runner, &mut report, &mut journal)
                .await;
        }

        if run.compose_only {
            info!("standalone phase disabled (compose-only)");
        } else {
            self.recreate_standalone(&standalone, &mut report, &mut journal)
                .await;
        }

        if run.prune_images {
            self.prune(&mut report, &mut journal).await;
        }

        report.planned_actions = journal.into_actions();
        let counts = report.counts();
        info!(
            unchanged = counts.unchanged,
            recreated = counts.recreated,
            updated = counts.updated,
            skipped = counts.skipped,
            failed = counts.failed,
            "run finished"
        );
        Ok(report)
    }

    async fn refresh_projects<R: ComposeRunner>(
        &self,
        projects: &[ComposeProject],
        runner: Option<Arc<R>>,
        report: &mut RunReport,
        journal: &mut ActionJournal,
    ) {
        let Some(runner) = runner else {
            for project in projects {
                info!(project = %project.name, "project filtered out");
                report.push(
                    EntityKind::Project,
                    &project.name,
                    Outcome::Skipped("filtered out".to_owned()),
                );
            }
            return;
        };

        let refresher = ComposeRefresher::from_config(runner, self.config);
        for project in projects {
            let outcome = refresher.reconcile(project, journal).await;
            report.push(EntityKind::Project, &project.name, outcome);
        }
    }

    async fn recreate_standalone(
        &self,
        containers: &[ContainerSummary],
        report: &mut RunReport,
        journal: &mut ActionJournal,
    ) {
        let filter = self.config.filters.containers();
        let executor = RecreationExecutor::from_config(Arc::clone(&self.docker), self.config);

        for container in containers {
            if !filter.includes(&container.name) {
                info!(container = %container.name, "container filtered out");
                report.push(
                    EntityKind::Container,
                    &container.name,
                    Outcome::Skipped("filtered out".to_owned()),
                );
                continue;
            }
            let outcome = executor.reconcile(&container.id, journal).await;
            report.push(EntityKind::Container, &container.name, outcome);
        }
    }

    async fn prune(&self, report: &mut RunReport, journal: &mut ActionJournal) {
        if self.config.run.dry_run {
            journal.record(PlannedAction::PruneImages);
            return;
        }

        match self.docker.prune_dangling_images().await {
            Ok(summary) => {
                info!(
                    images_deleted = summary.images_deleted,
                    space_reclaimed = summary.space_reclaimed,
                    status = "ok",
                    "dangling images pruned"
                );
                report.pruned = Some(summary);
            }
            Err(e) => warn!(error = %e, "image prune failed"),
        }
    }
}
