//! 도메인 타입 -- 컨테이너 서술자와 compose 프로젝트
//!
//! 런타임 조회 결과는 매 실행마다 새로 읽히며 실행 간에 캐시되지 않습니다.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// compose 관리 라벨 네임스페이스
pub const COMPOSE_LABEL_PREFIX: &str = "com.docker.compose.";
/// compose 프로젝트 이름 라벨
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
/// compose 프로젝트 작업 디렉토리 라벨
pub const COMPOSE_WORKING_DIR_LABEL: &str = "com.docker.compose.project.working_dir";
/// compose 설정 파일 목록 라벨 (쉼표 구분)
pub const COMPOSE_CONFIG_FILES_LABEL: &str = "com.docker.compose.project.config_files";

/// 실행 중인 컨테이너 요약 (목록 조회 결과)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// 컨테이너 ID
    pub id: String,
    /// 컨테이너 이름 (앞의 `/` 제거됨)
    pub name: String,
    /// 생성 시 지정된 이미지 참조
    pub image: String,
    /// 라벨
    pub labels: BTreeMap<String, String>,
}

impl ContainerSummary {
    /// 소속 compose 프로젝트 이름을 반환합니다.
    ///
    /// 빈 라벨 값은 소속 없음으로 취급합니다.
    pub fn compose_project(&self) -> Option<&str> {
        self.labels
            .get(COMPOSE_PROJECT_LABEL)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }
}

/// 재시작 정책
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// 정책 이름 (no, always, unless-stopped, on-failure, 빈 문자열)
    pub name: String,
    /// on-failure 최대 재시도 횟수
    pub max_retries: i64,
}

/// 공개 포트 바인딩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    /// 호스트 IP (빈 문자열이면 모든 인터페이스)
    pub host_ip: String,
    /// 호스트 포트 (빈 문자열이면 임의 할당)
    pub host_port: String,
    /// 컨테이너 포트 (프로토콜 포함, 예: `80/tcp`)
    pub container_port: String,
}

/// 마운트 종류
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MountKind {
    /// 호스트 경로 바인드
    Bind,
    /// 이름 있는 볼륨
    Volume,
    /// 메모리 tmpfs
    Tmpfs,
    /// 재생성하지 않는 기타 종류 (npipe, cluster 등)
    Other(String),
}

impl fmt::Display for MountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => write!(f, "bind"),
            Self::Volume => write!(f, "volume"),
            Self::Tmpfs => write!(f, "tmpfs"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// 마운트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// 마운트 종류
    pub kind: MountKind,
    /// 호스트 경로 또는 볼륨 이름
    pub source: String,
    /// 컨테이너 내부 경로
    pub destination: String,
    /// 읽기 전용 여부
    pub read_only: bool,
    /// tmpfs 옵션 (`size=64m,mode=1777` 형식, 있을 때만)
    pub tmpfs_options: Option<String>,
}

/// 장치 매핑
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// 호스트 장치 경로
    pub host_path: String,
    /// 컨테이너 장치 경로
    pub container_path: String,
    /// cgroup 권한 문자열 (예: `rwm`)
    pub permissions: String,
}

/// 컨테이너 서술자
///
/// 한 번의 inspect 조회로 얻은 컨테이너의 전체 런타임 설정입니다.
/// 재생성에 필요한 모든 항목을 담습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    /// 컨테이너 ID
    pub id: String,
    /// 컨테이너 이름
    pub name: String,
    /// 원래 지정된 이미지 참조 (repository:tag 또는 digest)
    pub image: String,
    /// 컨테이너가 생성된 이미지의 content-addressed ID
    pub image_id: String,
    /// 이미지 플랫폼 (`os/arch[/variant]`), 알 수 없으면 None
    pub platform: Option<String>,
    /// 호스트명
    pub hostname: String,
    /// 실행 사용자
    pub user: String,
    /// 작업 디렉토리
    pub working_dir: String,
    /// 네트워크 모드
    pub network_mode: String,
    /// 재시작 정책
    pub restart_policy: RestartPolicy,
    /// privileged 여부
    pub privileged: bool,
    /// 추가 capability
    pub cap_add: Vec<String>,
    /// 제거 capability
    pub cap_drop: Vec<String>,
    /// 추가 호스트 매핑 (`host:ip`)
    pub extra_hosts: Vec<String>,
    /// 공개 포트
    pub ports: Vec<PortBinding>,
    /// 마운트
    pub mounts: Vec<Mount>,
    /// 장치
    pub devices: Vec<Device>,
    /// 공유 메모리 크기 (바이트, 0이면 미지정)
    pub shm_size: i64,
    /// 환경변수 (`KEY=VALUE`, 원래 순서 유지)
    pub env: Vec<String>,
    /// 라벨
    pub labels: BTreeMap<String, String>,
    /// entrypoint
    pub entrypoint: Vec<String>,
    /// 명령 인자
    pub cmd: Vec<String>,
}

impl ContainerDescriptor {
    /// 소속 compose 프로젝트 이름을 반환합니다.
    pub fn compose_project(&self) -> Option<&str> {
        self.labels
            .get(COMPOSE_PROJECT_LABEL)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }
}

/// compose 프로젝트
///
/// 실행 중인 컨테이너의 라벨로부터 매번 새로 도출되는 뷰입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeProject {
    /// 프로젝트 이름
    pub name: String,
    /// 생성 시 기록된 작업 디렉토리
    pub working_dir: Option<PathBuf>,
    /// 설정 파일 경로 목록 (비어있을 수 있음)
    pub config_files: Vec<PathBuf>,
    /// 소속 컨테이너 ID 목록
    pub members: Vec<String>,
}

/// 이미지 조회 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDetails {
    /// content-addressed 이미지 ID
    pub id: String,
    /// 플랫폼 (`os/arch[/variant]`)
    pub platform: Option<String>,
}

/// dangling 이미지 정리 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneSummary {
    /// 삭제된 이미지 수
    pub images_deleted: usize,
    /// 회수된 공간 (바이트)
    pub space_reclaimed: u64,
}
