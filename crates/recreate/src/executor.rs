//! 재생성 실행기 -- 컨테이너 하나의 이미지 변경 감지와 교체
//!
//! [`RecreationExecutor::reconcile`]은 에러를 전파하지 않고 [`Outcome`]을 반환합니다.
//!
//! 처리 순서:
//! 1. 서술자 조회 (실패 시 `Failed`)
//! 2. 이미지 pull (실패는 경고만)
//! 3. 참조가 가리키는 로컬 이미지 ID 확인 (실패 시 `Failed`)
//! 4. ID가 같으면 `Unchanged`
//! 5. 다르면 실행 명세 합성 → 백업 기록 → stop → remove → create → start
//!
//! dry-run에서는 pull, 백업 기록, stop, remove, create를 [`ActionJournal`]에
//! 기록만 하고 조회는 그대로 수행합니다.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use recast_core::action::{ActionJournal, PlannedAction};
use recast_core::config::RecastConfig;
use recast_core::launch::LaunchSpec;
use recast_core::outcome::Outcome;
use recast_core::types::ContainerDescriptor;
use recast_runtime::docker::repository_of;
use recast_runtime::{DockerClient, Introspector, PullScope};
use tracing::{info, warn};

use crate::backup::BackupStore;
use crate::launch::synthesize;

/// 컨테이너 재생성 실행기
pub struct RecreationExecutor<D: DockerClient> {
    docker: Arc<D>,
    introspector: Introspector<D>,
    backups: BackupStore,
    stop_timeout_secs: u64,
    pull_all_platforms: bool,
    dry_run: bool,
}

impl<D: DockerClient> RecreationExecutor<D> {
    /// 새 실행기를 생성합니다. 기본값은 30초 정지 타임아웃, 플랫폼 고정 pull입니다.
    pub fn new(docker: Arc<D>, backups: BackupStore) -> Self {
        Self {
            introspector: Introspector::new(Arc::clone(&docker)),
            docker,
            backups,
            stop_timeout_secs: 30,
            pull_all_platforms: false,
            dry_run: false,
        }
    }

    /// 설정에서 실행기를 생성합니다.
    pub fn from_config(docker: Arc<D>, config: &RecastConfig) -> Self {
        Self::new(docker, BackupStore::new(config.general.backup_dir.clone()))
            .stop_timeout_secs(config.run.stop_timeout_secs)
            .pull_all_platforms(config.run.pull_all_platforms)
            .dry_run(config.run.dry_run)
    }

    /// 정지 타임아웃 (초)
    pub fn stop_timeout_secs(mut self, secs: u64) -> Self {
        self.stop_timeout_secs = secs;
        self
    }

    /// 모든 태그 pull 여부
    pub fn pull_all_platforms(mut self, enabled: bool) -> Self {
        self.pull_all_platforms = enabled;
        self
    }

    /// dry-run 여부
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// 컨테이너 하나를 처리합니다.
    pub async fn reconcile(&self, id: &str, journal: &mut ActionJournal) -> Outcome {
        let descriptor = match self.introspector.describe(id).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(container_id = id, error = %e, "cannot describe container");
                return Outcome::Failed(format!("describe: {e}"));
            }
        };

        self.pull(&descriptor, journal).await;

        let latest = match self.docker.inspect_image(&descriptor.image).await {
            Ok(image) => image,
            Err(e) => {
                warn!(
                    container = %descriptor.name,
                    image = %descriptor.image,
                    error = %e,
                    "cannot resolve image identity"
                );
                return Outcome::Failed(format!("resolve image {}: {e}", descriptor.image));
            }
        };

        if latest.id == descriptor.image_id {
            info!(
                container = %descriptor.name,
                image = %descriptor.image,
                status = "ok",
                "image unchanged"
            );
            return Outcome::Unchanged;
        }

        info!(
            container = %descriptor.name,
            image = %descriptor.image,
            current = %descriptor.image_id,
            latest = %latest.id,
            "newer image available, recreating"
        );

        let spec = synthesize(&descriptor);
        if self.dry_run {
            self.plan_swap(&descriptor, &spec, journal);
            return Outcome::Recreated { backup: None };
        }

        match self.swap(&descriptor, &spec).await {
            Ok(backup) => {
                info!(
                    container = %descriptor.name,
                    backup = %backup.display(),
                    status = "ok",
                    "container recreated"
                );
                Outcome::Recreated {
                    backup: Some(backup),
                }
            }
            Err(reason) => Outcome::Failed(reason),
        }
    }

    fn pull_scope(&self, descriptor: &ContainerDescriptor) -> PullScope {
        if self.pull_all_platforms {
            PullScope::AllTags
        } else {
            PullScope::Pinned(descriptor.platform.clone())
        }
    }

    async fn pull(&self, descriptor: &ContainerDescriptor, journal: &mut ActionJournal) {
        let scope = self.pull_scope(descriptor);
        if self.dry_run {
            let (image, platform, all_tags) = match &scope {
                PullScope::AllTags => (repository_of(&descriptor.image).to_owned(), None, true),
                PullScope::Pinned(platform) => (descriptor.image.clone(), platform.clone(), false),
            };
            journal.record(PlannedAction::Pull {
                image,
                platform,
                all_tags,
            });
            return;
        }

        if let Err(e) = self.docker.pull_image(&descriptor.image, &scope).await {
            warn!(
                container = %descriptor.name,
                image = %descriptor.image,
                error = %e,
                "pull failed, comparing against local image"
            );
        }
    }

    fn plan_swap(
        &self,
        descriptor: &ContainerDescriptor,
        spec: &LaunchSpec,
        journal: &mut ActionJournal,
    ) {
        journal.record(PlannedAction::WriteBackup {
            container: descriptor.name.clone(),
            dir: self.backup_dir(),
        });
        journal.record(PlannedAction::Stop {
            container: descriptor.name.clone(),
            timeout_secs: self.stop_timeout_secs,
        });
        journal.record(PlannedAction::Remove {
            container: descriptor.name.clone(),
        });
        journal.record(PlannedAction::Create {
            container: descriptor.name.clone(),
            command_line: spec.command_line(),
        });
    }

    fn backup_dir(&self) -> PathBuf {
        self.backups.dir().to_path_buf()
    }

    /// 백업 후 교체합니다. 백업이 없으면 어떤 변경도 하지 않습니다.
    async fn swap(
        &self,
        descriptor: &ContainerDescriptor,
        spec: &LaunchSpec,
    ) -> Result<PathBuf, String> {
        let backup = self
            .backups
            .write(spec, descriptor, Local::now())
            .await
            .map_err(|e| {
                warn!(
                    container = %descriptor.name,
                    error = %e,
                    "backup failed, container left running"
                );
                e.to_string()
            })?;
        info!(container = %descriptor.name, path = %backup.display(), "backup record written");

        if let Err(e) = self
            .docker
            .stop_container(&descriptor.id, self.stop_timeout_secs)
            .await
        {
            warn!(container = %descriptor.name, error = %e, "stop failed, continuing");
        }

        if let Err(e) = self.docker.remove_container(&descriptor.id).await {
            warn!(container = %descriptor.name, error = %e, "remove failed, continuing");
        }

        let new_id = self.docker.create_container(spec).await.map_err(|e| {
            warn!(
                container = %descriptor.name,
                backup = %backup.display(),
                error = %e,
                "create failed, restore from backup record"
            );
            format!("create: {e}")
        })?;

        self.docker.start_container(&new_id).await.map_err(|e| {
            warn!(
                container = %descriptor.name,
                container_id = %new_id,
                error = %e,
                "start failed"
            );
            format!("start: {e}")
        })?;

        Ok(backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::types::RestartPolicy;
    use recast_runtime::mock::{DockerCall, MockDockerClient};

    const ID: &str = "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00";

    fn descriptor() -> ContainerDescriptor {
        ContainerDescriptor {
            id: ID.to_owned(),
            name: "web".to_owned(),
            image: "nginx:1.27".to_owned(),
            image_id: "sha256:old".to_owned(),
            platform: Some("linux/amd64".to_owned()),
            restart_policy: RestartPolicy {
                name: "always".to_owned(),
                max_retries: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn pull_scope_follows_setting() {
        let dir = tempfile::tempdir().unwrap();
        let docker = Arc::new(MockDockerClient::new());
        let pinned = RecreationExecutor::new(Arc::clone(&docker), BackupStore::new(dir.path()));
        assert_eq!(
            pinned.pull_scope(&descriptor()),
            PullScope::Pinned(Some("linux/amd64".to_owned()))
        );

        let all =
            RecreationExecutor::new(docker, BackupStore::new(dir.path())).pull_all_platforms(true);
        assert_eq!(all.pull_scope(&descriptor()), PullScope::AllTags);
    }

    #[tokio::test]
    async fn dry_run_all_tags_pull_is_recorded_against_repository() {
        let dir = tempfile::tempdir().unwrap();
        let docker = Arc::new(
            MockDockerClient::new()
                .with_container(descriptor())
                .with_image("nginx:1.27", "sha256:old", None),
        );
        let executor = RecreationExecutor::new(Arc::clone(&docker), BackupStore::new(dir.path()))
            .pull_all_platforms(true)
            .dry_run(true);
        let mut journal = ActionJournal::new();

        let outcome = executor.reconcile(ID, &mut journal).await;

        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(
            journal.actions(),
            &[PlannedAction::Pull {
                image: "nginx".to_owned(),
                platform: None,
                all_tags: true,
            }]
        );
        assert!(docker.mutations().is_empty());
    }

    #[tokio::test]
    async fn start_failure_is_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockDockerClient::new()
            .with_container(descriptor())
            .with_image("nginx:1.27", "sha256:new", None);
        mock.fail_start = true;
        let docker = Arc::new(mock);
        let executor = RecreationExecutor::new(Arc::clone(&docker), BackupStore::new(dir.path()));

        let outcome = executor.reconcile(ID, &mut ActionJournal::new()).await;

        assert!(matches!(outcome, Outcome::Failed(ref r) if r.starts_with("start:")));
        assert!(docker.calls().iter().any(|c| matches!(c, DockerCall::Start(_))));
    }
}
