//! Domain entities: core data structures

use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::domain::DomainError;

/// Identifier tying an uploaded bundle to a deployable revision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionLabel(String);

impl VersionLabel {
    /// Prefix of generated labels.
    pub const PREFIX: &'static str = "v-";

    /// Generate a label from a timestamp: `v-YYYYMMDDHHMMSS`.
    pub fn generate<Tz: TimeZone>(now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(format!("{}{}", Self::PREFIX, now.format("%Y%m%d%H%M%S")))
    }

    /// Accept a user-supplied label verbatim.
    pub fn parse(label: &str) -> Result<Self, DomainError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(DomainError::InvalidVersionLabel(
                "label must not be empty".into(),
            ));
        }
        Ok(Self(label.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of an uploaded artifact bundle.
///
/// Key layout: `{app}/{version}/{app}-{version}.zip`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLocation {
    pub bucket: String,
    pub key: String,
}

impl BundleLocation {
    /// Archive file name for an application version.
    pub fn archive_name(app: &str, version: &VersionLabel) -> String {
        format!("{app}-{version}.zip")
    }

    /// Key prefix shared by all bundles of an application.
    pub fn app_prefix(app: &str) -> String {
        format!("{app}/")
    }

    pub fn for_version(bucket: &str, app: &str, version: &VersionLabel) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: format!("{app}/{version}/{}", Self::archive_name(app, version)),
        }
    }

    /// `s3://bucket/key` form.
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// A single environment option setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OptionSetting {
    pub namespace: String,
    pub option_name: String,
    pub value: String,
}

impl OptionSetting {
    pub fn new(namespace: &str, option_name: &str, value: impl Into<String>) -> Self {
        Self {
            namespace: namespace.to_string(),
            option_name: option_name.to_string(),
            value: value.into(),
        }
    }
}

/// Fixed option settings applied on every create and update.
pub fn environment_option_settings(
    instance_profile: &str,
    service_role: &str,
    port: u16,
) -> Vec<OptionSetting> {
    vec![
        OptionSetting::new(
            "aws:autoscaling:launchconfiguration",
            "IamInstanceProfile",
            instance_profile,
        ),
        OptionSetting::new("aws:elasticbeanstalk:environment", "ServiceRole", service_role),
        OptionSetting::new(
            "aws:elasticbeanstalk:application:environment",
            "PORT",
            port.to_string(),
        ),
    ]
}

/// Observed state of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentState {
    Absent,
    Present,
}

impl EnvironmentState {
    /// State from the number of live environments matching the name filter.
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::Absent
        } else {
            Self::Present
        }
    }
}

/// What the environment reconciler started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentAction {
    /// In-place update of an existing environment.
    Updated,
    /// New environment created on the given platform.
    Created { platform: String },
    /// Update raced with a deletion; created instead.
    RecreatedAfterMissing { platform: String },
}

impl fmt::Display for EnvironmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated => write!(f, "update started"),
            Self::Created { platform } => write!(f, "creation started on '{platform}'"),
            Self::RecreatedAfterMissing { platform } => write!(
                f,
                "environment vanished during update; creation started on '{platform}'"
            ),
        }
    }
}

/// Application version record as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationVersion {
    pub label: String,
    pub source: Option<BundleLocation>,
}

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~` for the home directory.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
