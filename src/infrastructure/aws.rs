//! `aws` command-line client adapter
//!
//! Implements [`CloudClient`] by shelling out through a [`CommandRunner`].
//! Every call appends `--region`, `--output json` and, when configured,
//! `--profile`. Non-zero exits become classified [`RemoteError`]s.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::domain::{
    ApplicationVersion, BundleLocation, OptionSetting, RemoteError, RemoteErrorKind, RemoteResult,
};
use crate::infrastructure::traits::{CloudClient, CommandRunner};

/// Adapter over the `aws` CLI.
pub struct AwsCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
    region: String,
    profile: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApplicationsResponse {
    #[serde(default)]
    applications: Vec<ApplicationDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApplicationDescription {
    application_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VersionsResponse {
    #[serde(default)]
    application_versions: Vec<VersionDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VersionDescription {
    version_label: String,
    source_bundle: Option<SourceBundle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceBundle {
    s3_bucket: String,
    s3_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnvironmentsResponse {
    #[serde(default)]
    environments: Vec<EnvironmentDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnvironmentDescription {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SolutionStacksResponse {
    #[serde(default)]
    solution_stacks: Vec<String>,
}

impl AwsCli {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        region: impl Into<String>,
        profile: Option<String>,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            region: region.into(),
            profile,
        }
    }

    /// Run `aws <service> <operation> <args...>` and return stdout.
    fn invoke(&self, service: &str, operation: &str, args: &[&str]) -> RemoteResult<String> {
        let name = format!("{service} {operation}");
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 8);
        full.push(service);
        full.push(operation);
        full.extend_from_slice(args);
        full.extend(["--region", self.region.as_str(), "--output", "json"]);
        if let Some(profile) = &self.profile {
            full.extend(["--profile", profile.as_str()]);
        }
        debug!("invoke: {} {}", self.program, full.join(" "));

        let output = self.runner.run(&self.program, &full).map_err(|e| {
            RemoteError::new(
                RemoteErrorKind::Unknown,
                &name,
                format!("cannot run {}: {e}", self.program),
            )
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            trace!("{name}: {stdout}");
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message: &str = if stderr.trim().is_empty() {
            &stdout
        } else {
            &stderr
        };
        let err = RemoteError::from_output(&name, message, output.status.code());
        debug!("{name} failed: kind={}, status={:?}", err.kind, err.exit_status);
        Err(err)
    }

    fn parse<T: DeserializeOwned>(operation: &str, body: &str) -> RemoteResult<T> {
        // Some operations print nothing on success.
        let body = if body.trim().is_empty() { "{}" } else { body };
        serde_json::from_str(body).map_err(|e| {
            RemoteError::new(
                RemoteErrorKind::Unknown,
                operation,
                format!("unexpected response: {e}"),
            )
        })
    }

    fn option_settings_json(options: &[OptionSetting]) -> RemoteResult<String> {
        serde_json::to_string(options).map_err(|e| {
            RemoteError::new(
                RemoteErrorKind::Unknown,
                "serialize option settings",
                e.to_string(),
            )
        })
    }

    /// Map a `NotFound` lookup failure to `false`.
    fn exists(result: RemoteResult<String>) -> RemoteResult<bool> {
        match result {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl CloudClient for AwsCli {
    fn head_bucket(&self, bucket: &str) -> RemoteResult<()> {
        self.invoke("s3api", "head-bucket", &["--bucket", bucket])
            .map(|_| ())
    }

    fn create_bucket(
        &self,
        bucket: &str,
        _region: &str,
        location_constraint: Option<&str>,
    ) -> RemoteResult<()> {
        let result = match location_constraint {
            Some(region) => {
                let config = format!("LocationConstraint={region}");
                self.invoke(
                    "s3api",
                    "create-bucket",
                    &[
                        "--bucket",
                        bucket,
                        "--create-bucket-configuration",
                        &config,
                    ],
                )
            }
            None => self.invoke("s3api", "create-bucket", &["--bucket", bucket]),
        };
        result.map(|_| ())
    }

    fn wait_bucket_exists(&self, bucket: &str) -> RemoteResult<()> {
        self.invoke("s3api", "wait", &["bucket-exists", "--bucket", bucket])
            .map(|_| ())
    }

    fn upload_file(&self, local: &Path, location: &BundleLocation) -> RemoteResult<()> {
        let local = local.to_string_lossy();
        let uri = location.uri();
        self.invoke("s3", "cp", &[&*local, &uri, "--only-show-errors"])
            .map(|_| ())
    }

    fn remove_objects(&self, bucket: &str, prefix: &str) -> RemoteResult<()> {
        let uri = format!("s3://{bucket}/{prefix}");
        self.invoke("s3", "rm", &[&uri, "--recursive", "--only-show-errors"])
            .map(|_| ())
    }

    fn delete_bucket(&self, bucket: &str) -> RemoteResult<()> {
        self.invoke("s3api", "delete-bucket", &["--bucket", bucket])
            .map(|_| ())
    }

    fn application_exists(&self, app: &str) -> RemoteResult<bool> {
        let body = self.invoke(
            "elasticbeanstalk",
            "describe-applications",
            &["--application-names", app],
        )?;
        let response: ApplicationsResponse = Self::parse("describe-applications", &body)?;
        Ok(response
            .applications
            .iter()
            .any(|a| a.application_name == app))
    }

    fn create_application(&self, app: &str) -> RemoteResult<()> {
        self.invoke(
            "elasticbeanstalk",
            "create-application",
            &["--application-name", app],
        )
        .map(|_| ())
    }

    fn delete_application(&self, app: &str) -> RemoteResult<()> {
        self.invoke(
            "elasticbeanstalk",
            "delete-application",
            &["--application-name", app, "--terminate-env-by-force"],
        )
        .map(|_| ())
    }

    fn create_application_version(
        &self,
        app: &str,
        label: &str,
        source: &BundleLocation,
    ) -> RemoteResult<()> {
        let bundle = format!("S3Bucket={},S3Key={}", source.bucket, source.key);
        self.invoke(
            "elasticbeanstalk",
            "create-application-version",
            &[
                "--application-name",
                app,
                "--version-label",
                label,
                "--source-bundle",
                &bundle,
            ],
        )
        .map(|_| ())
    }

    fn list_application_versions(&self, app: &str) -> RemoteResult<Vec<ApplicationVersion>> {
        let body = self.invoke(
            "elasticbeanstalk",
            "describe-application-versions",
            &["--application-name", app],
        )?;
        let response: VersionsResponse = Self::parse("describe-application-versions", &body)?;
        Ok(response
            .application_versions
            .into_iter()
            .map(|v| ApplicationVersion {
                label: v.version_label,
                source: v.source_bundle.map(|s| BundleLocation {
                    bucket: s.s3_bucket,
                    key: s.s3_key,
                }),
            })
            .collect())
    }

    fn delete_application_version(&self, app: &str, label: &str) -> RemoteResult<()> {
        self.invoke(
            "elasticbeanstalk",
            "delete-application-version",
            &[
                "--application-name",
                app,
                "--version-label",
                label,
                "--delete-source-bundle",
            ],
        )
        .map(|_| ())
    }

    fn count_environments(&self, app: &str, env: &str) -> RemoteResult<usize> {
        let body = self.invoke(
            "elasticbeanstalk",
            "describe-environments",
            &[
                "--application-name",
                app,
                "--environment-names",
                env,
                "--no-include-deleted",
            ],
        )?;
        let response: EnvironmentsResponse = Self::parse("describe-environments", &body)?;
        Ok(response
            .environments
            .iter()
            .filter(|e| e.status != "Terminated")
            .count())
    }

    fn update_environment(
        &self,
        app: &str,
        env: &str,
        label: &str,
        options: &[OptionSetting],
    ) -> RemoteResult<()> {
        let options = Self::option_settings_json(options)?;
        self.invoke(
            "elasticbeanstalk",
            "update-environment",
            &[
                "--application-name",
                app,
                "--environment-name",
                env,
                "--version-label",
                label,
                "--option-settings",
                &options,
            ],
        )
        .map(|_| ())
    }

    fn create_environment(
        &self,
        app: &str,
        env: &str,
        label: &str,
        platform: &str,
        options: &[OptionSetting],
    ) -> RemoteResult<()> {
        let options = Self::option_settings_json(options)?;
        self.invoke(
            "elasticbeanstalk",
            "create-environment",
            &[
                "--application-name",
                app,
                "--environment-name",
                env,
                "--version-label",
                label,
                "--solution-stack-name",
                platform,
                "--option-settings",
                &options,
            ],
        )
        .map(|_| ())
    }

    fn terminate_environment(&self, env: &str) -> RemoteResult<()> {
        self.invoke(
            "elasticbeanstalk",
            "terminate-environment",
            &["--environment-name", env],
        )
        .map(|_| ())
    }

    fn list_solution_stacks(&self) -> RemoteResult<Vec<String>> {
        let body = self.invoke("elasticbeanstalk", "list-available-solution-stacks", &[])?;
        let response: SolutionStacksResponse =
            Self::parse("list-available-solution-stacks", &body)?;
        Ok(response.solution_stacks)
    }

    fn role_exists(&self, role: &str) -> RemoteResult<bool> {
        Self::exists(self.invoke("iam", "get-role", &["--role-name", role]))
    }

    fn create_role(&self, role: &str, trust_policy: &str) -> RemoteResult<()> {
        self.invoke(
            "iam",
            "create-role",
            &[
                "--role-name",
                role,
                "--assume-role-policy-document",
                trust_policy,
            ],
        )
        .map(|_| ())
    }

    fn attach_role_policy(&self, role: &str, policy_arn: &str) -> RemoteResult<()> {
        self.invoke(
            "iam",
            "attach-role-policy",
            &["--role-name", role, "--policy-arn", policy_arn],
        )
        .map(|_| ())
    }

    fn instance_profile_exists(&self, profile: &str) -> RemoteResult<bool> {
        Self::exists(self.invoke(
            "iam",
            "get-instance-profile",
            &["--instance-profile-name", profile],
        ))
    }

    fn create_instance_profile(&self, profile: &str) -> RemoteResult<()> {
        self.invoke(
            "iam",
            "create-instance-profile",
            &["--instance-profile-name", profile],
        )
        .map(|_| ())
    }

    fn add_role_to_instance_profile(&self, profile: &str, role: &str) -> RemoteResult<()> {
        self.invoke(
            "iam",
            "add-role-to-instance-profile",
            &["--instance-profile-name", profile, "--role-name", role],
        )
        .map(|_| ())
    }
}
