//! Classification of remote failures
//!
//! The provider's command-line client only reports failures as free text
//! plus an exit status. Branching happens on [`RemoteErrorKind`], never on
//! the raw text: [`RemoteErrorKind::classify`] is the single place that
//! translates text into a tag.

use std::fmt;

use thiserror::Error;

/// Recognized remote failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The addressed resource does not exist.
    NotFound,
    /// The resource already exists or is in a conflicting state.
    Conflict,
    /// Throttling, timeouts, temporary unavailability.
    Transient,
    Unknown,
}

const NOT_FOUND_PATTERNS: &[&str] = &[
    "no environment found",
    "nosuchentity",
    "nosuchbucket",
    "not found",
    "does not exist",
    "(404)",
];

const CONFLICT_PATTERNS: &[&str] = &[
    "already exists",
    "entityalreadyexists",
    "bucketalreadyownedbyyou",
    "bucketalreadyexists",
    "(409)",
];

const TRANSIENT_PATTERNS: &[&str] = &[
    "throttling",
    "rate exceeded",
    "requesttimeout",
    "serviceunavailable",
    "could not connect",
    "timed out",
    "(503)",
];

impl RemoteErrorKind {
    /// Classify free-text client output. First matching table wins.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let matches = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

        if matches(NOT_FOUND_PATTERNS) {
            Self::NotFound
        } else if matches(CONFLICT_PATTERNS) {
            Self::Conflict
        } else if matches(TRANSIENT_PATTERNS) {
            Self::Transient
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Transient => "transient",
            Self::Unknown => "error",
        };
        f.write_str(s)
    }
}

/// Text the provider reports when the addressed environment is gone.
const ENVIRONMENT_MISSING: &str = "no environment found";

/// Operation whose failure exit status is propagated as the process exit code.
pub const UPDATE_ENVIRONMENT: &str = "elasticbeanstalk update-environment";

/// A failed remote operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed ({kind}): {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    /// Operation name, e.g. `elasticbeanstalk update-environment`
    pub operation: String,
    pub message: String,
    /// Exit status of the client process, if it ran to completion
    pub exit_status: Option<i32>,
}

impl RemoteError {
    /// Build an error from client output, classifying the text.
    pub fn from_output(operation: impl Into<String>, message: &str, exit_status: Option<i32>) -> Self {
        let message = message.trim().to_string();
        Self {
            kind: RemoteErrorKind::classify(&message),
            operation: operation.into(),
            message,
            exit_status,
        }
    }

    /// Build an error with an explicit kind.
    pub fn new(kind: RemoteErrorKind, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation: operation.into(),
            message: message.into(),
            exit_status: None,
        }
    }

    pub fn with_exit_status(mut self, status: i32) -> Self {
        self.exit_status = Some(status);
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteErrorKind::NotFound
    }

    /// The addressed environment itself does not exist.
    ///
    /// Narrower than [`Self::is_not_found`]: an update rejected because some
    /// other referenced resource is missing does not qualify.
    pub fn is_environment_missing(&self) -> bool {
        self.is_not_found() && self.message.to_lowercase().contains(ENVIRONMENT_MISSING)
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == RemoteErrorKind::Conflict
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
