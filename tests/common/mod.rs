//! Shared test doubles for the I/O boundary traits
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, TimeZone};

use ebdeploy::config::Settings;
use ebdeploy::domain::{
    ApplicationVersion, BundleLocation, OptionSetting, RemoteError, RemoteErrorKind,
    RemoteResult,
};
use ebdeploy::infrastructure::di::ServiceContainer;
use ebdeploy::infrastructure::traits::{
    Clock, CloudClient, CommandRunner, Prompter, RealFileSystem,
};

pub fn remote(kind: RemoteErrorKind, operation: &str, message: &str) -> RemoteError {
    RemoteError::new(kind, operation, message)
}

// ============================================================
// MockCloud
// ============================================================

/// Scriptable in-memory cloud that records every call.
///
/// Calls are recorded as `"<method> <key args>"`.
#[derive(Default)]
pub struct MockCloud {
    pub calls: Mutex<Vec<String>>,

    pub bucket_exists: bool,
    pub create_bucket_error: Option<RemoteError>,
    pub wait_bucket_error: Option<RemoteError>,
    pub upload_error: Option<RemoteError>,
    pub remove_objects_error: Option<RemoteError>,

    pub app_exists: bool,
    pub create_application_error: Option<RemoteError>,
    pub delete_application_error: Option<RemoteError>,
    pub create_version_error: Option<RemoteError>,
    pub versions: Vec<ApplicationVersion>,
    pub list_versions_error: Option<RemoteError>,
    /// Labels whose delete fails
    pub failing_version_deletes: Vec<String>,

    /// Successive environment counts; the last one repeats
    pub env_counts: Mutex<VecDeque<usize>>,
    pub count_error: Option<RemoteError>,
    pub update_error: Option<RemoteError>,
    pub create_environment_error: Option<RemoteError>,
    pub terminate_error: Option<RemoteError>,
    pub stacks: Vec<String>,
    pub list_stacks_error: Option<RemoteError>,

    pub roles: Mutex<HashSet<String>>,
    pub instance_profiles: Mutex<HashSet<String>>,
    /// When set, created roles and profiles never become visible
    pub identity_hidden: bool,
    pub create_role_error: Option<RemoteError>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env_counts(self, counts: &[usize]) -> Self {
        *self.env_counts.lock().unwrap() = counts.iter().copied().collect();
        self
    }

    pub fn with_roles(self, roles: &[&str]) -> Self {
        self.roles
            .lock()
            .unwrap()
            .extend(roles.iter().map(|r| r.to_string()));
        self
    }

    pub fn with_instance_profiles(self, profiles: &[&str]) -> Self {
        self.instance_profiles
            .lock()
            .unwrap()
            .extend(profiles.iter().map(|p| p.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls to `method`.
    pub fn count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(method))
            .count()
    }

    /// Calls that change remote state.
    pub fn mutations(&self) -> Vec<String> {
        const READS: &[&str] = &[
            "head_bucket",
            "wait_bucket_exists",
            "application_exists",
            "list_application_versions",
            "count_environments",
            "list_solution_stacks",
            "role_exists",
            "instance_profile_exists",
        ];
        self.calls()
            .into_iter()
            .filter(|c| {
                let method = c.split_whitespace().next().unwrap_or_default();
                !READS.contains(&method)
            })
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn fail_or(&self, error: &Option<RemoteError>) -> RemoteResult<()> {
        match error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl CloudClient for MockCloud {
    fn head_bucket(&self, bucket: &str) -> RemoteResult<()> {
        self.record(format!("head_bucket {bucket}"));
        if self.bucket_exists {
            Ok(())
        } else {
            Err(remote(RemoteErrorKind::NotFound, "s3api head-bucket", "Not Found"))
        }
    }

    fn create_bucket(
        &self,
        bucket: &str,
        region: &str,
        location_constraint: Option<&str>,
    ) -> RemoteResult<()> {
        self.record(format!(
            "create_bucket {bucket} {region} {}",
            location_constraint.unwrap_or("-")
        ));
        self.fail_or(&self.create_bucket_error)
    }

    fn wait_bucket_exists(&self, bucket: &str) -> RemoteResult<()> {
        self.record(format!("wait_bucket_exists {bucket}"));
        self.fail_or(&self.wait_bucket_error)
    }

    fn upload_file(&self, local: &Path, location: &BundleLocation) -> RemoteResult<()> {
        self.record(format!("upload_file {} {}", local.display(), location.uri()));
        self.fail_or(&self.upload_error)
    }

    fn remove_objects(&self, bucket: &str, prefix: &str) -> RemoteResult<()> {
        self.record(format!("remove_objects {bucket} {prefix}"));
        self.fail_or(&self.remove_objects_error)
    }

    fn delete_bucket(&self, bucket: &str) -> RemoteResult<()> {
        self.record(format!("delete_bucket {bucket}"));
        Ok(())
    }

    fn application_exists(&self, app: &str) -> RemoteResult<bool> {
        self.record(format!("application_exists {app}"));
        Ok(self.app_exists)
    }

    fn create_application(&self, app: &str) -> RemoteResult<()> {
        self.record(format!("create_application {app}"));
        self.fail_or(&self.create_application_error)
    }

    fn delete_application(&self, app: &str) -> RemoteResult<()> {
        self.record(format!("delete_application {app}"));
        self.fail_or(&self.delete_application_error)
    }

    fn create_application_version(
        &self,
        app: &str,
        label: &str,
        source: &BundleLocation,
    ) -> RemoteResult<()> {
        self.record(format!(
            "create_application_version {app} {label} {}",
            source.uri()
        ));
        self.fail_or(&self.create_version_error)
    }

    fn list_application_versions(&self, app: &str) -> RemoteResult<Vec<ApplicationVersion>> {
        self.record(format!("list_application_versions {app}"));
        match &self.list_versions_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.versions.clone()),
        }
    }

    fn delete_application_version(&self, app: &str, label: &str) -> RemoteResult<()> {
        self.record(format!("delete_application_version {app} {label}"));
        if self.failing_version_deletes.iter().any(|l| l == label) {
            Err(remote(
                RemoteErrorKind::Unknown,
                "elasticbeanstalk delete-application-version",
                "Access Denied",
            ))
        } else {
            Ok(())
        }
    }

    fn count_environments(&self, app: &str, env: &str) -> RemoteResult<usize> {
        self.record(format!("count_environments {app} {env}"));
        if let Some(e) = &self.count_error {
            return Err(e.clone());
        }
        let mut counts = self.env_counts.lock().unwrap();
        let count = if counts.len() > 1 {
            counts.pop_front().unwrap_or_default()
        } else {
            counts.front().copied().unwrap_or_default()
        };
        Ok(count)
    }

    fn update_environment(
        &self,
        app: &str,
        env: &str,
        label: &str,
        options: &[OptionSetting],
    ) -> RemoteResult<()> {
        self.record(format!(
            "update_environment {app} {env} {label} {}",
            options.len()
        ));
        self.fail_or(&self.update_error)
    }

    fn create_environment(
        &self,
        app: &str,
        env: &str,
        label: &str,
        platform: &str,
        options: &[OptionSetting],
    ) -> RemoteResult<()> {
        self.record(format!(
            "create_environment {app} {env} {label} {} [{platform}]",
            options.len()
        ));
        self.fail_or(&self.create_environment_error)
    }

    fn terminate_environment(&self, env: &str) -> RemoteResult<()> {
        self.record(format!("terminate_environment {env}"));
        self.fail_or(&self.terminate_error)
    }

    fn list_solution_stacks(&self) -> RemoteResult<Vec<String>> {
        self.record("list_solution_stacks".to_string());
        match &self.list_stacks_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.stacks.clone()),
        }
    }

    fn role_exists(&self, role: &str) -> RemoteResult<bool> {
        self.record(format!("role_exists {role}"));
        Ok(self.roles.lock().unwrap().contains(role))
    }

    fn create_role(&self, role: &str, _trust_policy: &str) -> RemoteResult<()> {
        self.record(format!("create_role {role}"));
        self.fail_or(&self.create_role_error)?;
        if !self.identity_hidden {
            self.roles.lock().unwrap().insert(role.to_string());
        }
        Ok(())
    }

    fn attach_role_policy(&self, role: &str, policy_arn: &str) -> RemoteResult<()> {
        self.record(format!("attach_role_policy {role} {policy_arn}"));
        Ok(())
    }

    fn instance_profile_exists(&self, profile: &str) -> RemoteResult<bool> {
        self.record(format!("instance_profile_exists {profile}"));
        Ok(self.instance_profiles.lock().unwrap().contains(profile))
    }

    fn create_instance_profile(&self, profile: &str) -> RemoteResult<()> {
        self.record(format!("create_instance_profile {profile}"));
        if !self.identity_hidden {
            self.instance_profiles
                .lock()
                .unwrap()
                .insert(profile.to_string());
        }
        Ok(())
    }

    fn add_role_to_instance_profile(&self, profile: &str, role: &str) -> RemoteResult<()> {
        self.record(format!("add_role_to_instance_profile {profile} {role}"));
        Ok(())
    }
}

// ============================================================
// FakeClock
// ============================================================

/// Virtual clock: `sleep` advances time instantly.
pub struct FakeClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn local_now(&self) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ============================================================
// ScriptedPrompter
// ============================================================

/// Prompter with a fixed answer that records the questions.
pub struct ScriptedPrompter {
    answer: bool,
    questions: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.answer)
    }
}

// ============================================================
// ScriptedRunner
// ============================================================

/// Command runner replaying canned outputs and recording argv.
pub struct ScriptedRunner {
    available: bool,
    outputs: Mutex<VecDeque<Output>>,
    invocations: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            available: true,
            outputs: Mutex::new(VecDeque::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Queue an output for the next `run`.
    pub fn push(&self, code: i32, stdout: &str, stderr: &str) {
        self.outputs
            .lock()
            .unwrap()
            .push_back(output(code, stdout, stderr));
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        let mut argv = vec![cmd.to_string()];
        argv.extend(args.iter().map(|a| a.to_string()));
        self.invocations.lock().unwrap().push(argv);
        Ok(self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| output(0, "", "")))
    }

    fn is_available(&self, _cmd: &str) -> bool {
        self.available
    }
}

#[cfg(unix)]
pub fn output(code: i32, stdout: &str, stderr: &str) -> Output {
    use std::os::unix::process::ExitStatusExt;
    Output {
        status: std::process::ExitStatus::from_raw(code << 8),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

// ============================================================
// Fixtures
// ============================================================

/// Settings with app/env/bucket filled in and the artifact at `artifact`.
pub fn deploy_settings(artifact: PathBuf) -> Settings {
    Settings {
        app: Some("hello".into()),
        env: Some("hello-env".into()),
        bucket: Some("hello-bucket".into()),
        region: "eu-central-1".into(),
        artifact,
        ..Settings::default()
    }
}

/// Container over test doubles and the real filesystem.
pub fn container(
    settings: Settings,
    runner: Arc<ScriptedRunner>,
    cloud: Arc<MockCloud>,
    clock: Arc<FakeClock>,
    prompter: Arc<ScriptedPrompter>,
) -> ServiceContainer {
    ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        runner,
        cloud,
        clock,
        prompter,
    )
}
