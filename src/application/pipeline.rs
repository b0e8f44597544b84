//! Step runner with a per-step policy table
//!
//! Every reconciliation step returns a [`StepOutcome`]. Whether a warning
//! stops the sequence, and whether a fatal error aborts it or is downgraded
//! to a warning, is decided here from [`POLICY_TABLE`], not by the steps.

use std::fmt;

use tracing::{info, warn};

use crate::application::{ApplicationError, ApplicationResult};

/// Named steps of the deploy and cleanup sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    PackageArtifact,
    EnsureBucket,
    EnsureApplication,
    UploadArtifact,
    RegisterVersion,
    EnsureInstanceProfile,
    EnsureServiceRole,
    ReconcileEnvironment,
    TerminateEnvironment,
    DeleteVersions,
    PurgeBucket,
    DeleteApplication,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PackageArtifact => "package artifact",
            Self::EnsureBucket => "ensure bucket",
            Self::EnsureApplication => "ensure application",
            Self::UploadArtifact => "upload artifact",
            Self::RegisterVersion => "register version",
            Self::EnsureInstanceProfile => "ensure instance profile",
            Self::EnsureServiceRole => "ensure service role",
            Self::ReconcileEnvironment => "reconcile environment",
            Self::TerminateEnvironment => "terminate environment",
            Self::DeleteVersions => "delete versions",
            Self::PurgeBucket => "purge bucket",
            Self::DeleteApplication => "delete application",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnWarning {
    Continue,
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFatal {
    Abort,
    /// Downgrade to a warning and keep going
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPolicy {
    pub on_warning: OnWarning,
    pub on_fatal: OnFatal,
}

const REQUIRED: StepPolicy = StepPolicy {
    on_warning: OnWarning::Continue,
    on_fatal: OnFatal::Abort,
};

const REQUIRED_STRICT: StepPolicy = StepPolicy {
    on_warning: OnWarning::Halt,
    on_fatal: OnFatal::Abort,
};

const BEST_EFFORT: StepPolicy = StepPolicy {
    on_warning: OnWarning::Continue,
    on_fatal: OnFatal::Continue,
};

pub const POLICY_TABLE: &[(Step, StepPolicy)] = &[
    (Step::PackageArtifact, REQUIRED),
    (Step::EnsureBucket, REQUIRED),
    (Step::EnsureApplication, REQUIRED_STRICT),
    (Step::UploadArtifact, REQUIRED),
    (Step::RegisterVersion, REQUIRED),
    (Step::EnsureInstanceProfile, REQUIRED),
    (Step::EnsureServiceRole, REQUIRED),
    (Step::ReconcileEnvironment, REQUIRED),
    (Step::TerminateEnvironment, BEST_EFFORT),
    (Step::DeleteVersions, BEST_EFFORT),
    (Step::PurgeBucket, BEST_EFFORT),
    (Step::DeleteApplication, BEST_EFFORT),
];

impl Step {
    /// Policy for this step; steps missing from the table abort on failure.
    pub fn policy(self) -> StepPolicy {
        POLICY_TABLE
            .iter()
            .find(|(step, _)| *step == self)
            .map(|(_, policy)| *policy)
            .unwrap_or(REQUIRED)
    }
}

/// Result of a single reconciliation step.
#[derive(Debug)]
pub enum StepOutcome<T = ()> {
    Success(T),
    SuccessWithWarning(T, String),
    Fatal(ApplicationError),
}

impl<T> StepOutcome<T> {
    /// Transform the success value, keeping warnings and failures.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StepOutcome<U> {
        match self {
            Self::Success(v) => StepOutcome::Success(f(v)),
            Self::SuccessWithWarning(v, msg) => StepOutcome::SuccessWithWarning(f(v), msg),
            Self::Fatal(e) => StepOutcome::Fatal(e),
        }
    }
}

impl<T, E: Into<ApplicationError>> From<Result<T, E>> for StepOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Fatal(e.into()),
        }
    }
}

/// Recorded status of an executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Ok,
    Warned(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub status: StepStatus,
}

/// Runs steps in order and records what happened.
#[derive(Debug, Default)]
pub struct Pipeline {
    records: Vec<StepRecord>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one step and apply its policy.
    ///
    /// Returns `Ok(Some(v))` when the step produced a value, `Ok(None)` when a
    /// fatal outcome was downgraded, and `Err` when the pipeline must stop.
    pub fn run<T>(
        &mut self,
        step: Step,
        f: impl FnOnce() -> StepOutcome<T>,
    ) -> ApplicationResult<Option<T>> {
        info!("step '{step}': start");
        let policy = step.policy();

        match f() {
            StepOutcome::Success(value) => {
                info!("step '{step}': ok");
                self.record(step, StepStatus::Ok);
                Ok(Some(value))
            }
            StepOutcome::SuccessWithWarning(value, message) => {
                warn!("{step}: {message}");
                self.record(step, StepStatus::Warned(message.clone()));
                match policy.on_warning {
                    OnWarning::Continue => Ok(Some(value)),
                    OnWarning::Halt => Err(ApplicationError::StepHalted { step, message }),
                }
            }
            StepOutcome::Fatal(err) => {
                self.record(step, StepStatus::Failed(err.to_string()));
                match policy.on_fatal {
                    OnFatal::Abort => Err(err),
                    OnFatal::Continue => {
                        warn!("{step}: {err} (continuing)");
                        Ok(None)
                    }
                }
            }
        }
    }

    fn record(&mut self, step: Step, status: StepStatus) {
        self.records.push(StepRecord { step, status });
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Steps that did not finish cleanly.
    pub fn warning_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status != StepStatus::Ok)
            .count()
    }
}
