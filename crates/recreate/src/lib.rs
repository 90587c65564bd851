//! recast 재생성 엔진
//!
//! 독립 실행 컨테이너의 이미지 변경을 감지하고, 같은 이름과 설정으로 새 컨테이너를 만듭니다.
//!
//! # Module Structure
//!
//! - [`launch`]: `ContainerDescriptor` → `LaunchSpec` 합성
//! - [`backup`]: 재실행 가능한 백업 기록 (`BackupStore`)
//! - [`executor`]: 컨테이너 단위 처리 (`RecreationExecutor`)
//! - [`error`]: 도메인 에러 (`RecreateError`)

pub mod backup;
pub mod error;
pub mod executor;
pub mod launch;

pub use backup::BackupStore;
pub use error::RecreateError;
pub use executor::RecreationExecutor;
pub use launch::{DEFAULT_SHM_SIZE, synthesize};
