//! recast compose 갱신
//!
//! 실행 중인 컨테이너의 compose 레이블에서 도출한 프로젝트를 원래 디렉토리에서
//! 다시 적용합니다. 멤버 컨테이너는 재생성 엔진이 아니라 compose가 교체합니다.
//!
//! # Module Structure
//!
//! - [`project`]: 작업 디렉토리 복원과 호출 컨텍스트
//! - [`env_file`]: `.env` 로딩 (`dotenvy`)
//! - [`refresher`]: 프로젝트 단위 처리 (`ComposeRefresher`)
//! - [`error`]: 도메인 에러 (`ComposeError`)

pub mod env_file;
pub mod error;
pub mod project;
pub mod refresher;

pub use error::ComposeError;
pub use project::resolve_working_dir;
pub use refresher::ComposeRefresher;
