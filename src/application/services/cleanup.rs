//! Decommission sequence
//!
//! Confirmation gate, then best-effort steps in order:
//! terminate environment → delete versions → purge bucket → delete application.
//! Only the gate can stop the sequence; every other failure is a warning.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::application::pipeline::{Pipeline, Step, StepOutcome, StepRecord};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{BundleLocation, CleanupRequest};
use crate::infrastructure::traits::{Clock, CloudClient, Prompter};

pub const TERMINATION_POLL_INTERVAL: Duration = Duration::from_secs(6);
pub const TERMINATION_TIMEOUT: Duration = Duration::from_secs(600);

/// How the environment step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing to terminate
    NotPresent,
    /// Termination call reported the environment as already gone
    AlreadyGone,
    Terminated,
    TimedOut,
}

/// Result of a cleanup run.
#[derive(Debug)]
pub struct CleanupReport {
    pub records: Vec<StepRecord>,
    pub termination: Option<Termination>,
    pub versions_deleted: usize,
    pub warnings: usize,
}

/// Cleanup service.
pub struct CleanupService {
    cloud: Arc<dyn CloudClient>,
    clock: Arc<dyn Clock>,
    prompter: Arc<dyn Prompter>,
}

impl CleanupService {
    pub fn new(
        cloud: Arc<dyn CloudClient>,
        clock: Arc<dyn Clock>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            cloud,
            clock,
            prompter,
        }
    }

    /// Run the whole sequence.
    pub fn run(&self, req: &CleanupRequest) -> ApplicationResult<CleanupReport> {
        self.confirm(req)?;

        let mut pipeline = Pipeline::new();
        let mut termination = None;
        if let Some(env) = &req.env {
            termination = pipeline.run(Step::TerminateEnvironment, || {
                self.terminate_environment(&req.app, env)
            })?;
        }

        let versions_deleted = pipeline
            .run(Step::DeleteVersions, || self.delete_versions(&req.app))?
            .unwrap_or(0);

        if let Some(bucket) = &req.bucket {
            pipeline.run(Step::PurgeBucket, || {
                self.purge_bucket(bucket, &req.app, req.delete_bucket)
            })?;
        }

        if req.delete_app {
            pipeline.run(Step::DeleteApplication, || {
                self.delete_application(&req.app)
            })?;
        }

        Ok(CleanupReport {
            warnings: pipeline.warning_count(),
            records: pipeline.records().to_vec(),
            termination,
            versions_deleted,
        })
    }

    /// Ask before destroying anything, unless `assume_yes`.
    pub fn confirm(&self, req: &CleanupRequest) -> ApplicationResult<()> {
        if req.assume_yes {
            return Ok(());
        }
        let mut question = String::from("The following actions will be performed:\n");
        for action in req.planned_actions() {
            question.push_str(&format!("  - {action}\n"));
        }
        question.push_str("Proceed?");

        let confirmed = self
            .prompter
            .confirm(&question)
            .map_err(|e| ApplicationError::OperationFailed {
                context: "read confirmation".into(),
                source: Box::new(e),
            })?;
        if confirmed {
            Ok(())
        } else {
            Err(ApplicationError::Aborted)
        }
    }

    /// Terminate `env` if it exists and wait (bounded) for it to disappear.
    pub fn terminate_environment(&self, app: &str, env: &str) -> StepOutcome<Termination> {
        match self.cloud.count_environments(app, env) {
            Ok(0) => return StepOutcome::Success(Termination::NotPresent),
            Ok(_) => {}
            Err(e) => return StepOutcome::Fatal(e.into()),
        }

        match self.cloud.terminate_environment(env) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return StepOutcome::Success(Termination::AlreadyGone),
            Err(e) => return StepOutcome::Fatal(e.into()),
        }
        info!("termination of {env} requested, waiting");

        if self.wait_until_gone(app, env) {
            StepOutcome::Success(Termination::Terminated)
        } else {
            StepOutcome::SuccessWithWarning(
                Termination::TimedOut,
                format!(
                    "environment '{env}' still present after {}s, continuing",
                    TERMINATION_TIMEOUT.as_secs()
                ),
            )
        }
    }

    /// Poll every [`TERMINATION_POLL_INTERVAL`] until gone or [`TERMINATION_TIMEOUT`].
    fn wait_until_gone(&self, app: &str, env: &str) -> bool {
        let deadline = self.clock.now() + TERMINATION_TIMEOUT;
        loop {
            match self.cloud.count_environments(app, env) {
                Ok(0) => return true,
                Ok(n) => debug!("{env}: {n} still present"),
                Err(e) => debug!("{env}: describe failed ({}), still waiting", e.kind),
            }
            if self.clock.now() >= deadline {
                return false;
            }
            self.clock.sleep(TERMINATION_POLL_INTERVAL);
        }
    }

    /// Delete every version of `app` with its bundle. Returns how many went.
    pub fn delete_versions(&self, app: &str) -> StepOutcome<usize> {
        let versions = match self.cloud.list_application_versions(app) {
            Ok(v) => v,
            Err(e) => return StepOutcome::Fatal(e.into()),
        };

        let mut deleted = 0;
        let mut failures = Vec::new();
        for version in &versions {
            let bundle = version
                .source
                .as_ref()
                .map(BundleLocation::uri)
                .unwrap_or_else(|| "no bundle".into());
            match self.cloud.delete_application_version(app, &version.label) {
                Ok(()) => {
                    debug!("deleted version {} ({bundle})", version.label);
                    deleted += 1;
                }
                Err(e) => failures.push(format!("{}: {}", version.label, e.message)),
            }
        }

        if failures.is_empty() {
            StepOutcome::Success(deleted)
        } else {
            StepOutcome::SuccessWithWarning(
                deleted,
                format!(
                    "{} of {} versions not deleted: {}",
                    failures.len(),
                    versions.len(),
                    failures.join("; ")
                ),
            )
        }
    }

    /// Remove the application's objects; optionally empty and delete the bucket.
    pub fn purge_bucket(&self, bucket: &str, app: &str, delete_bucket: bool) -> StepOutcome {
        let mut failures = Vec::new();

        if let Err(e) = self
            .cloud
            .remove_objects(bucket, &BundleLocation::app_prefix(app))
        {
            failures.push(e.to_string());
        }

        if delete_bucket {
            let emptied = self.cloud.remove_objects(bucket, "");
            match emptied.and_then(|_| self.cloud.delete_bucket(bucket)) {
                Ok(()) => info!("bucket {bucket} deleted"),
                Err(e) => failures.push(e.to_string()),
            }
        }

        if failures.is_empty() {
            StepOutcome::Success(())
        } else {
            StepOutcome::SuccessWithWarning((), failures.join("; "))
        }
    }

    /// Delete the application registration, force-terminating environments.
    pub fn delete_application(&self, app: &str) -> StepOutcome {
        match self.cloud.delete_application(app) {
            Ok(()) => StepOutcome::Success(()),
            Err(e) if e.is_not_found() => StepOutcome::Success(()),
            Err(e) => StepOutcome::Fatal(e.into()),
        }
    }
}
