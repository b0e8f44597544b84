//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    /// Missing or malformed input detected before any remote call
    #[error("{0}")]
    Usage(String),

    /// Invalid input that is not a usage error (exits 1)
    #[error("{0}")]
    Validation(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Validation(_) => exitcode::FAILURE,
            CliError::Infra(e) => match e {
                InfraError::MissingTool { .. } => exitcode::MISSING_TOOL,
                InfraError::Io { .. } => exitcode::FAILURE,
                InfraError::Application(app) => match app {
                    ApplicationError::MissingArtifact(_) => exitcode::MISSING_ARTIFACT,
                    ApplicationError::Domain(_) => exitcode::USAGE,
                    other => other.remote_exit_status().unwrap_or(exitcode::FAILURE),
                },
            },
        }
    }

    /// Whether usage help should accompany the message.
    pub fn is_usage(&self) -> bool {
        matches!(self, CliError::Usage(_))
    }
}
