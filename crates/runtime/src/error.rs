//! 런타임 에러 타입
//!
//! [`RuntimeError`]는 Docker API 호출과 compose 하위 프로세스 실행에서 발생하는
//! 모든 에러를 표현합니다. `From<RuntimeError> for RecastError` 변환이 구현되어 있어
//! 치명적 에러는 `?` 연산자로 상위 레이어까지 전파됩니다.

use recast_core::error::{RecastError, RuntimeFailure};

/// 런타임 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Docker 소켓 연결 실패
    #[error("docker connection error: {0}")]
    Connection(String),

    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    Api(String),

    /// 컨테이너 또는 이미지를 찾을 수 없음
    #[error("not found: {0}")]
    NotFound(String),

    /// inspect 결과를 해석할 수 없음
    #[error("cannot parse inspect data for '{id}': {reason}")]
    ParseFailure {
        /// 대상 컨테이너 ID
        id: String,
        /// 해석 실패 사유
        reason: String,
    },

    /// compose 명령 실패
    #[error("compose {command} failed for project '{project}': {reason}")]
    Compose {
        /// 프로젝트 이름
        project: String,
        /// 하위 명령 (pull, up)
        command: String,
        /// 실패 사유
        reason: String,
    },

    /// compose 명령을 찾을 수 없음
    #[error("neither 'docker compose' nor 'docker-compose' is available")]
    ComposeUnavailable,

    /// 제한 시간 초과
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// 동작 이름
        operation: String,
        /// 제한 시간 (초)
        secs: u64,
    },
}

impl RuntimeError {
    /// 대상이 없어서 실패했는지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<RuntimeError> for RecastError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Connection(msg) => RecastError::Runtime(RuntimeFailure::Unreachable(msg)),
            RuntimeError::ComposeUnavailable => {
                RecastError::Runtime(RuntimeFailure::MissingCapability(err.to_string()))
            }
            other => RecastError::Runtime(RuntimeFailure::Api(other.to_string())),
        }
    }
}
