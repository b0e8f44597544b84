//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `$XDG_CONFIG_HOME/ebdeploy/ebdeploy.toml` (or `--config`)
//! 3. Environment variables: `AWS_DEFAULT_REGION`, `AWS_REGION`, `AWS_PROFILE`,
//!    then `EB_*`
//! 4. Command-line flags (applied by the caller via [`Settings::apply`])

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::request::{require, validate_bucket_name};
use crate::domain::{
    expand_env_vars, CleanupRequest, DeployRequest, DomainError, PlatformPreference, VersionLabel,
};

/// Also the region in which bucket creation must omit the location constraint.
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PLATFORM: &str = "64bit Amazon Linux 2023 v4.3.0 running Corretto 17";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_INSTANCE_PROFILE: &str = "aws-elasticbeanstalk-ec2-role";
pub const DEFAULT_SERVICE_ROLE: &str = "aws-elasticbeanstalk-service-role";
pub const DEFAULT_ARTIFACT: &str = "build/libs/app.jar";
pub const DEFAULT_AWS_CLI: &str = "aws";

/// Environment variable map (`config::Map`), injectable for tests.
pub type EnvVars = config::Map<String, String>;

/// Unified configuration for ebdeploy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub app: Option<String>,
    pub env: Option<String>,
    pub bucket: Option<String>,
    pub region: String,
    pub profile: Option<String>,
    /// Fallback platform descriptor
    pub platform: String,
    /// Port the application listens on (`PORT` option setting)
    pub port: u16,
    pub instance_profile: String,
    pub service_role: String,
    /// Pre-built jar to deploy
    pub artifact: PathBuf,
    /// AWS command-line client
    pub aws_cli: String,
    /// Runtime preference for platform resolution
    pub runtime: PlatformPreference,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: None,
            env: None,
            bucket: None,
            region: DEFAULT_REGION.into(),
            profile: None,
            platform: DEFAULT_PLATFORM.into(),
            port: DEFAULT_PORT,
            instance_profile: DEFAULT_INSTANCE_PROFILE.into(),
            service_role: DEFAULT_SERVICE_ROLE.into(),
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            aws_cli: DEFAULT_AWS_CLI.into(),
            runtime: PlatformPreference::default(),
        }
    }
}

/// Raw settings for intermediate parsing; `None` means "not specified".
///
/// Used for the config file and for command-line overrides.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RawSettings {
    pub app: Option<String>,
    pub env: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub platform: Option<String>,
    pub port: Option<u16>,
    pub instance_profile: Option<String>,
    pub service_role: Option<String>,
    pub artifact: Option<PathBuf>,
    pub aws_cli: Option<String>,
    pub runtime: Option<PlatformPreference>,
}

/// Get the XDG config directory for ebdeploy.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ebdeploy").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("ebdeploy.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay every specified field of `raw` onto self.
    pub fn apply(&self, raw: &RawSettings) -> Self {
        Self {
            app: raw.app.clone().or_else(|| self.app.clone()),
            env: raw.env.clone().or_else(|| self.env.clone()),
            bucket: raw.bucket.clone().or_else(|| self.bucket.clone()),
            region: raw.region.clone().unwrap_or_else(|| self.region.clone()),
            profile: raw.profile.clone().or_else(|| self.profile.clone()),
            platform: raw
                .platform
                .clone()
                .unwrap_or_else(|| self.platform.clone()),
            port: raw.port.unwrap_or(self.port),
            instance_profile: raw
                .instance_profile
                .clone()
                .unwrap_or_else(|| self.instance_profile.clone()),
            service_role: raw
                .service_role
                .clone()
                .unwrap_or_else(|| self.service_role.clone()),
            artifact: raw
                .artifact
                .clone()
                .unwrap_or_else(|| self.artifact.clone()),
            aws_cli: raw.aws_cli.clone().unwrap_or_else(|| self.aws_cli.clone()),
            runtime: raw.runtime.clone().unwrap_or_else(|| self.runtime.clone()),
        }
    }

    /// Load settings from defaults, config file and the process environment.
    ///
    /// `config_path` overrides the XDG location; an explicitly given file
    /// must exist, the XDG one is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with_env(config_path, None)
    }

    /// Like [`Settings::load`], reading environment variables from `env`
    /// instead of the process when given.
    pub fn load_with_env(
        config_path: Option<&Path>,
        env: Option<EnvVars>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file
        match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.apply(&load_raw_settings(path)?);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        current = current.apply(&load_raw_settings(&global_path)?);
                    }
                }
            }
        }

        // 3. Environment variables
        current = current.apply(&Self::env_overrides(env)?);

        Ok(current)
    }

    /// Collect `AWS_*` and `EB_*` variables into a RawSettings layer.
    ///
    /// `EB_*` wins over `AWS_*`; `AWS_REGION` wins over `AWS_DEFAULT_REGION`.
    fn env_overrides(env: Option<EnvVars>) -> Result<RawSettings, ApplicationError> {
        let aws = Config::builder()
            .add_source(Environment::with_prefix("AWS").source(env.clone()))
            .build()
            .map_err(config_err)?;
        let eb = Config::builder()
            .add_source(Environment::with_prefix("EB").source(env))
            .build()
            .map_err(config_err)?;

        let get = |c: &Config, key: &str| c.get_string(key).ok().filter(|v| !v.is_empty());

        let port = match get(&eb, "port") {
            Some(v) => Some(
                v.trim()
                    .parse::<u16>()
                    .map_err(|_| ApplicationError::from(DomainError::InvalidPort(v.clone())))?,
            ),
            None => None,
        };

        Ok(RawSettings {
            app: get(&eb, "app_name"),
            env: get(&eb, "env_name"),
            bucket: get(&eb, "bucket"),
            region: get(&eb, "region")
                .or_else(|| get(&aws, "region"))
                .or_else(|| get(&aws, "default_region")),
            profile: get(&eb, "profile").or_else(|| get(&aws, "profile")),
            platform: get(&eb, "platform"),
            port,
            instance_profile: get(&eb, "instance_profile"),
            service_role: get(&eb, "service_role"),
            artifact: get(&eb, "artifact").map(PathBuf::from),
            aws_cli: get(&eb, "aws_cli"),
            runtime: None,
        })
    }

    /// Expanded artifact path (`~`, `$VAR`).
    pub fn artifact_path(&self) -> PathBuf {
        PathBuf::from(expand_env_vars(self.artifact.to_string_lossy().as_ref()))
    }

    /// Validate into a deploy request. `version` is the user's label, if any.
    pub fn deploy_request(
        &self,
        version: Option<&str>,
        now: &DateTime<Local>,
    ) -> Result<DeployRequest, DomainError> {
        let app = require(self.app.as_deref(), "application name", "--app", "EB_APP_NAME")?;
        let env = require(self.env.as_deref(), "environment name", "--env", "EB_ENV_NAME")?;
        let bucket = require(self.bucket.as_deref(), "bucket", "--bucket", "EB_BUCKET")?;
        validate_bucket_name(&bucket)?;

        let version = match version {
            Some(label) => VersionLabel::parse(label)?,
            None => VersionLabel::generate(now),
        };

        Ok(DeployRequest {
            app,
            env,
            bucket,
            region: self.region.clone(),
            artifact: self.artifact_path(),
            version,
            platform: self.platform.clone(),
            platform_preference: self.runtime.clone(),
            port: self.port,
            instance_profile: self.instance_profile.clone(),
            service_role: self.service_role.clone(),
        })
    }

    /// Validate into a cleanup request.
    ///
    /// A missing application is a `MissingField`; a malformed bucket a
    /// `MalformedBucket`. The caller maps them to different exit codes.
    pub fn cleanup_request(
        &self,
        delete_bucket: bool,
        delete_app: bool,
        assume_yes: bool,
    ) -> Result<CleanupRequest, DomainError> {
        let app = require(self.app.as_deref(), "application name", "--app", "EB_APP_NAME")?;
        let bucket = self
            .bucket
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        if let Some(b) = &bucket {
            validate_bucket_name(b)?;
        }

        Ok(CleanupRequest {
            app,
            env: self
                .env
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            bucket,
            delete_bucket,
            delete_app,
            assume_yes,
        })
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# ebdeploy configuration
#
# Precedence (lowest to highest):
#   compiled defaults
#   this file (~/.config/ebdeploy/ebdeploy.toml, or --config <file>)
#   environment: AWS_DEFAULT_REGION, AWS_REGION, AWS_PROFILE, EB_* (e.g. EB_APP_NAME)
#   command-line flags

# Application, environment and bucket names (required for deploy)
# app = "hello-world"
# env = "hello-world-env"
# bucket = "my-deploy-bucket"

# region = "us-east-1"
# profile = "default"

# Platform used when no matching one can be resolved
# platform = "64bit Amazon Linux 2023 v4.3.0 running Corretto 17"

# port = 5000
# instance_profile = "aws-elasticbeanstalk-ec2-role"
# service_role = "aws-elasticbeanstalk-service-role"

# Pre-built jar (~ and $VAR are expanded)
# artifact = "build/libs/app.jar"

# aws_cli = "aws"

[runtime]
# runtime_family = "Corretto"
# runtime_version = "17"
# os_images = ["Amazon Linux 2023", "Amazon Linux 2"]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
