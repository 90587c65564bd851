//! recast 공통 크레이트
//!
//! 설정, 에러, 도메인 타입, 이름 필터, 실행 명세, 실행 결과를 제공합니다.
//! 다른 모든 recast 크레이트가 이 크레이트에 의존합니다.

pub mod action;
pub mod config;
pub mod error;
pub mod filter;
pub mod launch;
pub mod outcome;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LockError, RecastError, RuntimeFailure};

// 설정
pub use config::RecastConfig;

// 필터
pub use filter::{NameFilter, NameList};

// 실행 명세
pub use launch::{LaunchArg, LaunchSpec};

// 결과
pub use action::{ActionJournal, PlannedAction};
pub use outcome::{EntityKind, EntityReport, Outcome, RunReport};

// 도메인 타입
pub use types::{
    ComposeProject, ContainerDescriptor, ContainerSummary, Device, ImageDetails, Mount,
    MountKind, PortBinding, PruneSummary, RestartPolicy,
};
