//! CLI-specific error types and exit code mapping

use recast_core::error::{RecastError, RuntimeFailure};

/// CLI-specific error type.
///
/// Entity-level failures never reach this type; they are carried in the run report.
/// The `exit_code()` method maps the remaining fatal errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from recast-core.
    #[error("{0}")]
    Core(#[from] RecastError),

    /// Logging setup failure.
    #[error("logging setup failed: {0}")]
    Logging(#[from] anyhow::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                        |
    /// |------|------------------------------------------------|
    /// | 0    | Success, or another instance holds the lock    |
    /// | 1    | General / command error                        |
    /// | 2    | Configuration error                            |
    /// | 3    | Runtime unreachable or capability missing      |
    /// | 10   | IO error                                       |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::Core(err) => match err {
                RecastError::Config(_) => 2,
                RecastError::Runtime(
                    RuntimeFailure::Unreachable(_) | RuntimeFailure::MissingCapability(_),
                ) => 3,
                RecastError::Io(_) => 10,
                RecastError::Runtime(RuntimeFailure::Api(_)) | RecastError::Lock(_) => 1,
            },
            Self::JsonSerialize(_) | Self::Command(_) | Self::Logging(_) => 1,
        }
    }
}
