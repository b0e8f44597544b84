//! Validated inputs of the deploy and cleanup pipelines
//!
//! Built once from the resolved settings and passed by reference into every
//! step. Nothing downstream reads process environment or flags.

use std::path::PathBuf;

use crate::domain::platform::PlatformPreference;
use crate::domain::{DomainError, VersionLabel};

/// Everything the deploy pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub app: String,
    pub env: String,
    pub bucket: String,
    pub region: String,
    pub artifact: PathBuf,
    pub version: VersionLabel,
    /// Fallback platform when resolution finds nothing
    pub platform: String,
    pub platform_preference: PlatformPreference,
    pub port: u16,
    pub instance_profile: String,
    pub service_role: String,
}

/// Everything the cleanup pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRequest {
    pub app: String,
    pub env: Option<String>,
    pub bucket: Option<String>,
    pub delete_bucket: bool,
    pub delete_app: bool,
    pub assume_yes: bool,
}

impl CleanupRequest {
    /// Human-readable list of destructive actions, in execution order.
    pub fn planned_actions(&self) -> Vec<String> {
        let mut actions = Vec::new();
        if let Some(env) = &self.env {
            actions.push(format!("terminate environment '{env}' (if it exists)"));
        }
        actions.push(format!(
            "delete all application versions of '{}' and their source bundles",
            self.app
        ));
        if let Some(bucket) = &self.bucket {
            actions.push(format!("remove s3://{bucket}/{}/*", self.app));
            if self.delete_bucket {
                actions.push(format!("empty and delete bucket '{bucket}'"));
            }
        }
        if self.delete_app {
            actions.push(format!(
                "delete application '{}' (force-terminating remaining environments)",
                self.app
            ));
        }
        actions
    }
}

/// Return the value if present and non-blank, else a `MissingField` error.
pub fn require(
    value: Option<&str>,
    field: &'static str,
    flag: &'static str,
    env_var: &'static str,
) -> Result<String, DomainError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::MissingField {
            field,
            flag,
            env_var,
        }),
    }
}

/// Reject bucket names that would be parsed as a flag by the client.
pub fn validate_bucket_name(bucket: &str) -> Result<(), DomainError> {
    if bucket.starts_with('-') {
        return Err(DomainError::MalformedBucket(bucket.to_string()));
    }
    Ok(())
}
