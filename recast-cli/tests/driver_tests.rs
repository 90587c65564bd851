//! 통합 테스트 -- 한 번의 실행 전체 흐름 검증
//!
//! ping → 목록 조회 → compose 프로젝트 갱신 → 독립 컨테이너 재생성 → 이미지 정리
//! 순서를 Mock Docker 클라이언트와 Mock compose 실행기로 테스트합니다.

use std::future::{Ready, ready};
use std::path::Path;
use std::sync::Arc;

use recast_cli::driver::Reconciler;
use recast_core::action::PlannedAction;
use recast_core::config::RecastConfig;
use recast_core::error::{RecastError, RuntimeFailure};
use recast_core::filter::NameList;
use recast_core::outcome::{EntityKind, Outcome};
use recast_core::types::{
    COMPOSE_PROJECT_LABEL, COMPOSE_WORKING_DIR_LABEL, ContainerDescriptor, RestartPolicy,
};
use recast_runtime::mock::{DockerCall, MockComposeRunner, MockDockerClient};
use recast_runtime::{ComposeStep, RuntimeError};

const WEB_ID: &str = "1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a";
const CACHE_ID: &str = "2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b";
const SHOP_APP_ID: &str = "3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c3c";
const SHOP_DB_ID: &str = "4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d";

type Detect = Ready<Result<Arc<MockComposeRunner>, RuntimeError>>;

fn container(id: &str, name: &str, image: &str, image_id: &str) -> ContainerDescriptor {
    ContainerDescriptor {
        id: id.to_owned(),
        name: name.to_owned(),
        image: image.to_owned(),
        image_id: image_id.to_owned(),
        network_mode: "bridge".to_owned(),
        restart_policy: RestartPolicy {
            name: "always".to_owned(),
            max_retries: 0,
        },
        ..Default::default()
    }
}

fn compose_member(id: &str, name: &str, project: &str, working_dir: &Path) -> ContainerDescriptor {
    let mut descriptor = container(id, name, "postgres:16", "sha256:pg");
    descriptor
        .labels
        .insert(COMPOSE_PROJECT_LABEL.to_owned(), project.to_owned());
    descriptor.labels.insert(
        COMPOSE_WORKING_DIR_LABEL.to_owned(),
        working_dir.display().to_string(),
    );
    descriptor
}

/// web은 새 이미지가 있고 cache는 최신이며 shop 프로젝트가 실행 중인 호스트
fn host(project_dir: &Path) -> MockDockerClient {
    let client = MockDockerClient::new()
        .with_container(compose_member(SHOP_APP_ID, "shop-app-1", "shop", project_dir))
        .with_container(container(WEB_ID, "web", "nginx:1.27", "sha256:old"))
        .with_container(compose_member(SHOP_DB_ID, "shop-db-1", "shop", project_dir))
        .with_container(container(CACHE_ID, "cache", "redis:7", "sha256:redis"))
        .with_image("nginx:1.27", "sha256:old", Some("linux/amd64"))
        .with_image("redis:7", "sha256:redis", Some("linux/amd64"))
        .with_prune_result(3, 4096);
    client.retag_image("nginx:1.27", "sha256:new");
    client
}

fn config(backups: &Path) -> RecastConfig {
    let mut config = RecastConfig::default();
    config.general.backup_dir = backups.to_path_buf();
    config.run.stop_timeout_secs = 10;
    config
}

fn compose(runner: &Arc<MockComposeRunner>) -> impl FnOnce() -> Detect {
    let runner = Arc::clone(runner);
    move || ready(Ok(runner))
}

fn compose_missing() -> impl FnOnce() -> Detect {
    || ready(Err(RuntimeError::ComposeUnavailable))
}

fn inspected(client: &MockDockerClient) -> Vec<String> {
    client
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            DockerCall::Inspect(id) => Some(id),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn full_run_refreshes_projects_then_recreates_standalone() {
    // Given
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let runner = Arc::new(MockComposeRunner::new());
    let config = config(backups.path());

    // When
    let report = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-1", compose(&runner))
        .await
        .unwrap();

    // Then: 프로젝트가 먼저, 그 다음 독립 컨테이너가 발견 순서대로
    let order: Vec<(EntityKind, &str)> = report
        .entities
        .iter()
        .map(|e| (e.kind, e.name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (EntityKind::Project, "shop"),
            (EntityKind::Container, "web"),
            (EntityKind::Container, "cache"),
        ]
    );
    assert_eq!(
        report.outcome_of(EntityKind::Project, "shop"),
        Some(&Outcome::Updated)
    );
    assert!(matches!(
        report.outcome_of(EntityKind::Container, "web"),
        Some(Outcome::Recreated { backup: Some(_) })
    ));
    assert_eq!(
        report.outcome_of(EntityKind::Container, "cache"),
        Some(&Outcome::Unchanged)
    );

    let steps: Vec<ComposeStep> = runner.calls().into_iter().map(|c| c.step).collect();
    assert_eq!(steps, vec![ComposeStep::Pull, ComposeStep::Up]);

    // compose 멤버는 컨테이너 재생성 경로를 타지 않습니다
    let inspected = inspected(&docker);
    assert!(!inspected.iter().any(|id| id == SHOP_APP_ID || id == SHOP_DB_ID));

    let pruned = report.pruned.as_ref().unwrap();
    assert_eq!(pruned.images_deleted, 3);
    assert_eq!(pruned.space_reclaimed, 4096);
    assert_eq!(docker.mutations().last(), Some(&DockerCall::Prune));
    assert!(report.planned_actions.is_empty());
}

#[tokio::test]
async fn unreachable_daemon_is_fatal_before_any_change() {
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(MockDockerClient::new().failing_ping());
    let runner = Arc::new(MockComposeRunner::new());
    let config = config(backups.path());

    let err = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-2", compose(&runner))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RecastError::Runtime(RuntimeFailure::Unreachable(_))
    ));
    assert_eq!(docker.calls(), vec![DockerCall::Ping]);
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn missing_compose_is_fatal_when_projects_are_eligible() {
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let config = config(backups.path());

    let err = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-3", compose_missing())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RecastError::Runtime(RuntimeFailure::MissingCapability(_))
    ));
    assert!(docker.mutations().is_empty(), "nothing may change");
    assert!(inspected(&docker).is_empty());
}

#[tokio::test]
async fn missing_compose_is_irrelevant_when_all_projects_filtered() {
    // Given: shop 프로젝트가 제외됨
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let mut config = config(backups.path());
    config.filters.exclude_projects = NameList::parse("shop");

    // When: compose가 없어도
    let report = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-4", compose_missing())
        .await
        .unwrap();

    // Then
    assert_eq!(
        report.outcome_of(EntityKind::Project, "shop"),
        Some(&Outcome::Skipped("filtered out".to_owned()))
    );
    assert!(matches!(
        report.outcome_of(EntityKind::Container, "web"),
        Some(Outcome::Recreated { .. })
    ));
}

#[tokio::test]
async fn standalone_only_never_touches_compose() {
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let mut config = config(backups.path());
    config.run.standalone_only = true;

    let report = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-5", compose_missing())
        .await
        .unwrap();

    assert!(report.outcome_of(EntityKind::Project, "shop").is_none());
    assert_eq!(report.counts().recreated, 1);
    assert_eq!(report.counts().unchanged, 1);
}

#[tokio::test]
async fn compose_only_leaves_standalone_containers_alone() {
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let runner = Arc::new(MockComposeRunner::new());
    let mut config = config(backups.path());
    config.run.compose_only = true;

    let report = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-6", compose(&runner))
        .await
        .unwrap();

    assert_eq!(report.entities.len(), 1);
    assert_eq!(report.entities[0].kind, EntityKind::Project);
    assert!(inspected(&docker).is_empty());
    assert_eq!(docker.mutations(), vec![DockerCall::Prune]);
}

#[tokio::test]
async fn container_filter_skips_without_inspecting() {
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let runner = Arc::new(MockComposeRunner::new());
    let mut config = config(backups.path());
    config.filters.only_containers = NameList::parse("cache");

    let report = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-7", compose(&runner))
        .await
        .unwrap();

    assert_eq!(
        report.outcome_of(EntityKind::Container, "web"),
        Some(&Outcome::Skipped("filtered out".to_owned()))
    );
    assert_eq!(
        report.outcome_of(EntityKind::Container, "cache"),
        Some(&Outcome::Unchanged)
    );
    // 컨테이너 필터는 compose 프로젝트에 적용되지 않습니다
    assert_eq!(
        report.outcome_of(EntityKind::Project, "shop"),
        Some(&Outcome::Updated)
    );
    assert_eq!(inspected(&docker), vec![CACHE_ID.to_owned()]);
}

#[tokio::test]
async fn entity_failure_does_not_abort_the_run() {
    // Given: shop의 up이 실패
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let runner = Arc::new(MockComposeRunner::new().failing("shop", ComposeStep::Up));
    let config = config(backups.path());

    // When
    let report = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-8", compose(&runner))
        .await
        .unwrap();

    // Then: 나머지 엔티티는 계속 처리됩니다
    assert!(matches!(
        report.outcome_of(EntityKind::Project, "shop"),
        Some(Outcome::Failed(_))
    ));
    assert!(matches!(
        report.outcome_of(EntityKind::Container, "web"),
        Some(Outcome::Recreated { .. })
    ));
    assert_eq!(report.counts().failed, 1);
    assert!(report.pruned.is_some());
}

#[tokio::test]
async fn dry_run_changes_nothing_and_plans_everything() {
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let runner = Arc::new(MockComposeRunner::new());
    let mut config = config(backups.path());
    config.run.dry_run = true;

    let report = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-9", compose(&runner))
        .await
        .unwrap();

    assert!(report.dry_run);
    assert!(docker.mutations().is_empty());
    assert!(runner.calls().is_empty());
    assert_eq!(std::fs::read_dir(backups.path()).unwrap().count(), 0);
    assert!(report.pruned.is_none());

    let actions = &report.planned_actions;
    assert!(matches!(actions.first(), Some(PlannedAction::Compose { .. })));
    assert_eq!(actions.last(), Some(&PlannedAction::PruneImages));
    assert!(actions.iter().any(|a| matches!(
        a,
        PlannedAction::Create { container, .. } if container == "web"
    )));
    assert!(!actions.iter().any(|a| matches!(
        a,
        PlannedAction::Create { container, .. } if container == "cache"
    )));
}

#[tokio::test]
async fn prune_disabled_skips_prune() {
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let runner = Arc::new(MockComposeRunner::new());
    let mut config = config(backups.path());
    config.run.prune_images = false;

    let report = Reconciler::new(&config, Arc::clone(&docker))
        .run("run-10", compose(&runner))
        .await
        .unwrap();

    assert!(report.pruned.is_none());
    assert!(!docker.mutations().contains(&DockerCall::Prune));
}

#[tokio::test]
async fn second_run_finds_nothing_to_recreate() {
    let project_dir = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let docker = Arc::new(host(project_dir.path()));
    let runner = Arc::new(MockComposeRunner::new());
    let mut config = config(backups.path());
    config.filters.exclude_projects = NameList::parse("shop");

    let reconciler = Reconciler::new(&config, Arc::clone(&docker));
    reconciler.run("run-11", compose(&runner)).await.unwrap();
    docker.clear_calls();
    let second = reconciler.run("run-12", compose(&runner)).await.unwrap();

    assert_eq!(
        second.outcome_of(EntityKind::Container, "web"),
        Some(&Outcome::Unchanged)
    );
    assert_eq!(second.counts().recreated, 0);
    let container_changes: Vec<DockerCall> = docker
        .mutations()
        .into_iter()
        .filter(|c| !matches!(c, DockerCall::Pull { .. } | DockerCall::Prune))
        .collect();
    assert!(container_changes.is_empty());
}
