//! 테스트용 Mock 런타임
//!
//! 설정 가능한 응답을 반환하고 모든 호출을 순서대로 기록하여
//! Docker 데몬이나 compose 바이너리 없이 테스트할 수 있습니다.
//! `test-util` feature (또는 이 크레이트의 테스트)에서만 컴파일됩니다.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use recast_core::launch::LaunchSpec;
use recast_core::types::{ContainerDescriptor, ContainerSummary, ImageDetails, PruneSummary};

use crate::compose::{ComposeCommand, ComposeInvocation, ComposeRunner, ComposeStep};
use crate::docker::{DockerClient, PullScope};
use crate::error::RuntimeError;

/// 기록된 Docker 호출
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerCall {
    /// ping
    Ping,
    /// 컨테이너 목록
    List,
    /// 컨테이너 조회
    Inspect(String),
    /// 이미지 조회
    InspectImage(String),
    /// 이미지 pull
    Pull {
        /// 이미지 참조
        reference: String,
        /// pull 범위
        scope: PullScope,
    },
    /// 정지
    Stop {
        /// 컨테이너 ID
        id: String,
        /// 타임아웃
        timeout_secs: u64,
    },
    /// 제거
    Remove(String),
    /// 생성
    Create {
        /// 컨테이너 이름
        name: String,
        /// 이미지 참조
        image: String,
    },
    /// 시작
    Start(String),
    /// dangling 이미지 정리
    Prune,
}

impl DockerCall {
    /// 런타임 상태를 바꾸는 호출인지 확인합니다.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Pull { .. }
                | Self::Stop { .. }
                | Self::Remove(_)
                | Self::Create { .. }
                | Self::Start(_)
                | Self::Prune
        )
    }
}

#[derive(Default)]
struct MockState {
    containers: Vec<ContainerDescriptor>,
    images: HashMap<String, ImageDetails>,
    removed: HashMap<String, ContainerDescriptor>,
    unparseable: HashSet<String>,
    calls: Vec<DockerCall>,
    next_id: u64,
}

/// 테스트용 Mock Docker 클라이언트
///
/// - `remove_container`는 컨테이너를 목록에서 제거합니다.
/// - `create_container`는 같은 이름의 컨테이너가 있으면 실패하고, 없으면
///   제거된 서술자를 새 ID와 현재 이미지 ID로 되살립니다.
#[derive(Default)]
pub struct MockDockerClient {
    state: Mutex<MockState>,
    /// ping 실패
    pub fail_ping: bool,
    /// pull 실패
    pub fail_pull: bool,
    /// stop 실패
    pub fail_stop: bool,
    /// remove 실패
    pub fail_remove: bool,
    /// create 실패
    pub fail_create: bool,
    /// start 실패
    pub fail_start: bool,
    /// prune 결과
    pub prune_result: PruneSummary,
}

impl MockDockerClient {
    /// 빈 mock 클라이언트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 실행 중인 컨테이너를 추가합니다.
    pub fn with_container(self, descriptor: ContainerDescriptor) -> Self {
        self.lock().containers.push(descriptor);
        self
    }

    /// 로컬 이미지를 등록합니다. 참조와 이미지 ID 양쪽으로 조회됩니다.
    pub fn with_image(self, reference: &str, id: &str, platform: Option<&str>) -> Self {
        let details = ImageDetails {
            id: id.to_owned(),
            platform: platform.map(str::to_owned),
        };
        {
            let mut state = self.lock();
            state.images.insert(reference.to_owned(), details.clone());
            state.images.insert(id.to_owned(), details);
        }
        self
    }

    /// inspect 결과를 해석할 수 없는 컨테이너 ID를 지정합니다.
    pub fn with_unparseable(self, id: &str) -> Self {
        self.lock().unparseable.insert(id.to_owned());
        self
    }

    /// pull이 실패하도록 설정합니다.
    pub fn failing_pull(mut self) -> Self {
        self.fail_pull = true;
        self
    }

    /// stop이 실패하도록 설정합니다.
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// remove가 실패하도록 설정합니다.
    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    /// create가 실패하도록 설정합니다.
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// ping이 실패하도록 설정합니다.
    pub fn failing_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    /// prune 결과를 설정합니다.
    pub fn with_prune_result(mut self, images_deleted: usize, space_reclaimed: u64) -> Self {
        self.prune_result = PruneSummary {
            images_deleted,
            space_reclaimed,
        };
        self
    }

    /// 로컬 이미지 참조가 가리키는 ID를 바꿉니다 (새 이미지가 pull된 상황).
    pub fn retag_image(&self, reference: &str, id: &str) {
        let mut state = self.lock();
        let platform = state.images.get(reference).and_then(|d| d.platform.clone());
        let details = ImageDetails {
            id: id.to_owned(),
            platform,
        };
        state.images.insert(reference.to_owned(), details.clone());
        state.images.insert(id.to_owned(), details);
    }

    /// 지금까지의 호출 기록
    pub fn calls(&self) -> Vec<DockerCall> {
        self.lock().calls.clone()
    }

    /// 상태를 바꾼 호출만 반환합니다.
    pub fn mutations(&self) -> Vec<DockerCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// 호출 기록을 비웁니다.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// 현재 실행 중인 컨테이너 서술자
    pub fn containers(&self) -> Vec<ContainerDescriptor> {
        self.lock().containers.clone()
    }

    fn record(&self, call: DockerCall) {
        self.lock().calls.push(call);
    }
}

impl DockerClient for MockDockerClient {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.record(DockerCall::Ping);
        if self.fail_ping {
            return Err(RuntimeError::Connection("mock daemon unreachable".to_owned()));
        }
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        self.record(DockerCall::List);
        Ok(self
            .lock()
            .containers
            .iter()
            .map(|d| ContainerSummary {
                id: d.id.clone(),
                name: d.name.clone(),
                image: d.image.clone(),
                labels: d.labels.clone(),
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDescriptor, RuntimeError> {
        self.record(DockerCall::Inspect(id.to_owned()));
        let state = self.lock();
        if state.unparseable.contains(id) {
            return Err(RuntimeError::ParseFailure {
                id: id.to_owned(),
                reason: "mock malformed inspect".to_owned(),
            });
        }
        state
            .containers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(id.to_owned()))
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageDetails, RuntimeError> {
        self.record(DockerCall::InspectImage(reference.to_owned()));
        self.lock()
            .images
            .get(reference)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(reference.to_owned()))
    }

    async fn pull_image(&self, reference: &str, scope: &PullScope) -> Result<(), RuntimeError> {
        self.record(DockerCall::Pull {
            reference: reference.to_owned(),
            scope: scope.clone(),
        });
        if self.fail_pull {
            return Err(RuntimeError::Api(format!("mock pull failure for {reference}")));
        }
        Ok(())
    }

    async fn stop_container(&self, id: &str, timeout_secs: u64) -> Result<(), RuntimeError> {
        self.record(DockerCall::Stop {
            id: id.to_owned(),
            timeout_secs,
        });
        if self.fail_stop {
            return Err(RuntimeError::Api("mock stop failure".to_owned()));
        }
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.record(DockerCall::Remove(id.to_owned()));
        if self.fail_remove {
            return Err(RuntimeError::Api("mock remove failure".to_owned()));
        }
        let mut state = self.lock();
        if let Some(pos) = state.containers.iter().position(|c| c.id == id) {
            let removed = state.containers.remove(pos);
            state.removed.insert(removed.name.clone(), removed);
        }
        Ok(())
    }

    async fn create_container(&self, spec: &LaunchSpec) -> Result<String, RuntimeError> {
        let name = spec.name().unwrap_or_default().to_owned();
        self.record(DockerCall::Create {
            name: name.clone(),
            image: spec.image.clone(),
        });
        if self.fail_create {
            return Err(RuntimeError::Api("mock create failure".to_owned()));
        }

        let mut state = self.lock();
        if state.containers.iter().any(|c| c.name == name) {
            return Err(RuntimeError::Api(format!(
                "conflict: container name '{name}' is already in use"
            )));
        }

        state.next_id += 1;
        let id = format!("{:064x}", state.next_id);
        let image_id = state
            .images
            .get(&spec.image)
            .map(|d| d.id.clone())
            .unwrap_or_default();

        let mut descriptor = state.removed.remove(&name).unwrap_or_default();
        descriptor.id = id.clone();
        descriptor.name = name;
        descriptor.image = spec.image.clone();
        descriptor.image_id = image_id;
        state.containers.push(descriptor);
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.record(DockerCall::Start(id.to_owned()));
        if self.fail_start {
            return Err(RuntimeError::Api("mock start failure".to_owned()));
        }
        Ok(())
    }

    async fn prune_dangling_images(&self) -> Result<PruneSummary, RuntimeError> {
        self.record(DockerCall::Prune);
        Ok(self.prune_result.clone())
    }
}

/// 기록된 compose 호출
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeCall {
    /// 호출 컨텍스트
    pub invocation: ComposeInvocation,
    /// 하위 명령
    pub step: ComposeStep,
}

/// 테스트용 Mock compose 실행기
pub struct MockComposeRunner {
    command: ComposeCommand,
    calls: Mutex<Vec<ComposeCall>>,
    failing: HashSet<(String, &'static str)>,
}

impl Default for MockComposeRunner {
    fn default() -> Self {
        Self {
            command: ComposeCommand::V2,
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
        }
    }
}

impl MockComposeRunner {
    /// 모든 호출이 성공하는 실행기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 특정 프로젝트의 하위 명령이 실패하도록 설정합니다.
    pub fn failing(mut self, project: &str, step: ComposeStep) -> Self {
        self.failing.insert((project.to_owned(), step.name()));
        self
    }

    /// 지금까지의 호출 기록
    pub fn calls(&self) -> Vec<ComposeCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ComposeRunner for MockComposeRunner {
    fn command(&self) -> ComposeCommand {
        self.command
    }

    async fn run(
        &self,
        invocation: &ComposeInvocation,
        step: ComposeStep,
    ) -> Result<(), RuntimeError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ComposeCall {
                invocation: invocation.clone(),
                step,
            });
        if self
            .failing
            .contains(&(invocation.project.clone(), step.name()))
        {
            return Err(RuntimeError::Compose {
                project: invocation.project.clone(),
                command: step.name().to_owned(),
                reason: "mock exit status 1".to_owned(),
            });
        }
        Ok(())
    }
}
