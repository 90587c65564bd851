//! compose 프로젝트 갱신기
//!
//! 프로젝트 하나에 대해 `pull` 후 `up -d --remove-orphans`를 실행합니다.
//! 실패는 해당 프로젝트의 [`Outcome::Failed`]로만 기록됩니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use recast_core::action::{ActionJournal, PlannedAction};
use recast_core::config::RecastConfig;
use recast_core::filter::NameFilter;
use recast_core::outcome::Outcome;
use recast_core::types::ComposeProject;
use recast_runtime::{ComposeRunner, ComposeStep};
use tracing::{info, warn};

use crate::env_file::load_env_file;
use crate::project::{invocation, resolve_working_dir};

/// 실행 순서
const STEPS: [ComposeStep; 2] = [ComposeStep::Pull, ComposeStep::Up];

/// compose 프로젝트 갱신기
pub struct ComposeRefresher<R: ComposeRunner> {
    runner: Arc<R>,
    filter: NameFilter,
    standalone_only: bool,
    dry_run: bool,
}

impl<R: ComposeRunner> ComposeRefresher<R> {
    /// 필터 없는 갱신기를 생성합니다.
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            runner,
            filter: NameFilter::default(),
            standalone_only: false,
            dry_run: false,
        }
    }

    /// 설정에서 갱신기를 생성합니다.
    pub fn from_config(runner: Arc<R>, config: &RecastConfig) -> Self {
        Self::new(runner)
            .filter(config.filters.projects())
            .standalone_only(config.run.standalone_only)
            .dry_run(config.run.dry_run)
    }

    /// 프로젝트 이름 필터
    pub fn filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }

    /// 독립 컨테이너만 처리하는 실행인지 여부
    pub fn standalone_only(mut self, enabled: bool) -> Self {
        self.standalone_only = enabled;
        self
    }

    /// dry-run 여부
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// 프로젝트 하나를 처리합니다.
    pub async fn reconcile(
        &self,
        project: &ComposeProject,
        journal: &mut ActionJournal,
    ) -> Outcome {
        if self.standalone_only {
            return Outcome::Skipped("standalone-only run".to_owned());
        }
        if !self.filter.includes(&project.name) {
            info!(project = %project.name, "project filtered out");
            return Outcome::Skipped("filtered out".to_owned());
        }

        let working_dir = match resolve_working_dir(project) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(project = %project.name, error = %e, "skipping project");
                return Outcome::Skipped(e.to_string());
            }
        };

        let env = load_env_file(&working_dir).unwrap_or_else(|e| {
            warn!(project = %project.name, error = %e, "ignoring env file");
            BTreeMap::new()
        });

        let invocation = invocation(project, working_dir, env);
        for step in STEPS {
            if self.dry_run {
                journal.record(PlannedAction::Compose {
                    project: project.name.clone(),
                    command_line: invocation.command_line(self.runner.command(), step),
                });
                continue;
            }

            if let Err(e) = self.runner.run(&invocation, step).await {
                warn!(
                    project = %project.name,
                    step = step.name(),
                    error = %e,
                    "compose failed"
                );
                return Outcome::Failed(e.to_string());
            }
        }

        info!(
            project = %project.name,
            working_dir = %invocation.working_dir.display(),
            status = "ok",
            "project refreshed"
        );
        Outcome::Updated
    }
}
