//! 에러 타입 -- 도메인별 에러 정의
//!
//! 실행 전체를 중단시키는 치명적 에러만 여기에 모입니다.
//! 컨테이너/프로젝트 단위 실패는 에러로 전파하지 않고
//! [`Outcome::Failed`](crate::outcome::Outcome::Failed)로 기록됩니다.

/// recast 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum RecastError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 런타임(컨테이너 데몬) 관련 에러
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeFailure),

    /// 실행 잠금 에러
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 동시에 켤 수 없는 옵션 조합
    #[error("'{first}' and '{second}' are mutually exclusive")]
    Conflict { first: String, second: String },
}

/// 런타임 관련 치명적 에러
///
/// 실행 시작 전에 감지되어 어떤 변경도 일어나기 전에 중단시킵니다.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeFailure {
    /// 데몬에 접근할 수 없음
    #[error("container runtime unreachable: {0}")]
    Unreachable(String),

    /// 필수 기능(예: compose 플러그인)이 없음
    #[error("missing required capability: {0}")]
    MissingCapability(String),

    /// 기타 API 실패
    #[error("{0}")]
    Api(String),
}

/// 실행 잠금 에러
///
/// 다른 인스턴스가 잠금을 보유한 경우는 에러가 아닙니다 (정상 종료 대상).
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// 잠금 파일 생성/열기 실패
    #[error("cannot open lock file {path}: {reason}")]
    Open { path: String, reason: String },

    /// 잠금 파일이 일반 파일이 아님
    #[error("lock file {path} is not a regular file")]
    NotRegularFile { path: String },
}

impl RecastError {
    /// 설정 에러인지 확인합니다.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
