//! recast 런타임 크레이트
//!
//! 컨테이너 런타임과의 모든 통신을 담당합니다.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error type (`RuntimeError`)
//! - [`docker`]: Docker API abstraction (`DockerClient` trait, `BollardDockerClient`)
//! - [`introspect`]: Inspect data → `ContainerDescriptor`, compose project grouping
//! - [`compose`]: compose CLI detection and invocation (`ComposeRunner` trait)
//! - `mock`: recording test doubles (`test-util` feature)

pub mod compose;
pub mod docker;
pub mod error;
pub mod introspect;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

// --- Public API Re-exports ---

// Error
pub use error::RuntimeError;

// Docker API
pub use docker::{BollardDockerClient, DockerClient, PullScope};

// Introspection
pub use introspect::{Introspector, descriptor_from_inspect, group_projects, standalone};

// Compose
pub use compose::{CliComposeRunner, ComposeCommand, ComposeInvocation, ComposeRunner, ComposeStep};
