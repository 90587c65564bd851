//! compose 갱신 에러 타입
//!
//! 모두 프로젝트 단위 실패로, 실행기는 [`Outcome`](recast_core::outcome::Outcome)으로 기록합니다.

use std::path::PathBuf;

use recast_core::error::RecastError;
use recast_runtime::RuntimeError;

/// compose 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// 작업 디렉토리를 복원할 수 없음
    #[error("working directory for project '{project}' not found (recorded: {recorded})")]
    WorkingDirUnresolved {
        /// 프로젝트 이름
        project: String,
        /// 기록된 작업 디렉토리
        recorded: String,
    },

    /// `.env` 파일 읽기/파싱 실패
    #[error("env file {path} unreadable: {reason}")]
    EnvFile {
        /// 파일 경로
        path: PathBuf,
        /// 실패 사유
        reason: String,
    },

    /// compose 실행 실패
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<ComposeError> for RecastError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::Runtime(e) => e.into(),
            other => RecastError::Io(std::io::Error::other(other.to_string())),
        }
    }
}
