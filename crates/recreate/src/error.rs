//! 재생성 엔진 에러 타입
//!
//! [`RecreateError`]는 `From<RecreateError> for RecastError` 변환을 제공합니다.
//! 실행기는 이 에러를 전파하지 않고 컨테이너 단위 결과로 기록합니다.

use recast_core::error::RecastError;
use recast_runtime::RuntimeError;

/// 재생성 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RecreateError {
    /// 백업 기록 실패
    #[error("backup record for '{container}' not written to {path}: {reason}")]
    Backup {
        /// 컨테이너 이름
        container: String,
        /// 대상 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 런타임 호출 실패
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<RecreateError> for RecastError {
    fn from(err: RecreateError) -> Self {
        match err {
            RecreateError::Runtime(e) => e.into(),
            RecreateError::Backup { .. } => RecastError::Io(std::io::Error::other(err.to_string())),
        }
    }
}
