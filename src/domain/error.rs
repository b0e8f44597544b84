//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid input detected before any remote call.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("missing required value: {field} (use {flag} or ${env_var})")]
    MissingField {
        field: &'static str,
        flag: &'static str,
        env_var: &'static str,
    },

    #[error("invalid bucket name '{0}': must not start with '-'")]
    MalformedBucket(String),

    #[error("invalid version label: {0}")]
    InvalidVersionLabel(String),

    #[error("invalid port '{0}'")]
    InvalidPort(String),
}
