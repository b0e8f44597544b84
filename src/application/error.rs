//! Application-level errors (wraps domain and remote errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::application::pipeline::Step;
use crate::domain::remote::UPDATE_ENVIRONMENT;
use crate::domain::{DomainError, RemoteError};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("artifact not found: {0} (build it first, e.g. `./gradlew build`, or pass --jar)")]
    MissingArtifact(PathBuf),

    #[error("packaging failed: {message}")]
    Packaging { message: String },

    #[error("step '{step}' halted the pipeline: {message}")]
    StepHalted { step: Step, message: String },

    #[error("aborted by user")]
    Aborted,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Client exit status to reuse as the process exit code.
    ///
    /// Only environment updates propagate it; zero is never propagated.
    pub fn remote_exit_status(&self) -> Option<i32> {
        match self {
            Self::Remote(e) if e.operation == UPDATE_ENVIRONMENT => {
                e.exit_status.filter(|s| *s != 0)
            }
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
