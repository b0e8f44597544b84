//! Deploy sequence
//!
//! package → bucket → application → upload → version → instance profile →
//! service role → environment. Each step's failure handling comes from the
//! pipeline policy table.

use std::sync::Arc;

use crate::application::pipeline::{Pipeline, Step, StepOutcome, StepRecord};
use crate::application::services::{
    ArtifactService, BucketService, EnvironmentService, PackagedArtifact, RegistrationService,
    RoleService,
};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{BundleLocation, DeployRequest, EnvironmentAction};
use crate::infrastructure::traits::{Clock, CloudClient, FileSystem};

/// Result of a deploy run.
#[derive(Debug)]
pub struct DeployReport {
    pub records: Vec<StepRecord>,
    pub location: BundleLocation,
    pub environment: EnvironmentAction,
    pub warnings: usize,
}

/// Deploy workflow.
pub struct DeployWorkflow {
    artifacts: ArtifactService,
    buckets: BucketService,
    registration: RegistrationService,
    roles: RoleService,
    environments: EnvironmentService,
}

impl DeployWorkflow {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cloud: Arc<dyn CloudClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            artifacts: ArtifactService::new(fs, cloud.clone()),
            buckets: BucketService::new(cloud.clone()),
            registration: RegistrationService::new(cloud.clone()),
            roles: RoleService::new(cloud.clone(), clock),
            environments: EnvironmentService::new(cloud),
        }
    }

    /// Fail with `MissingArtifact` before anything remote happens.
    pub fn check_artifact(&self, req: &DeployRequest) -> ApplicationResult<()> {
        self.artifacts.ensure_exists(&req.artifact)
    }

    pub fn run(&self, req: &DeployRequest) -> ApplicationResult<DeployReport> {
        let mut pipeline = Pipeline::new();

        let packaged = pipeline
            .run(Step::PackageArtifact, || -> StepOutcome<PackagedArtifact> {
                self.artifacts
                    .package(&req.artifact, &req.app, &req.version, &req.bucket)
                    .into()
            })?
            .ok_or_else(|| missing_value(Step::PackageArtifact))?;

        pipeline.run(Step::EnsureBucket, || {
            self.buckets.ensure(&req.bucket, &req.region)
        })?;
        pipeline.run(Step::EnsureApplication, || {
            self.registration.ensure_application(&req.app)
        })?;

        let location = pipeline
            .run(Step::UploadArtifact, || self.artifacts.upload(&packaged))?
            .ok_or_else(|| missing_value(Step::UploadArtifact))?;
        // scratch dir is removed here
        drop(packaged);

        pipeline.run(Step::RegisterVersion, || {
            self.registration
                .register_version(&req.app, &req.version, &location)
        })?;
        pipeline.run(Step::EnsureInstanceProfile, || {
            self.roles.ensure_instance_profile(&req.instance_profile)
        })?;
        pipeline.run(Step::EnsureServiceRole, || {
            self.roles.ensure_service_role(&req.service_role)
        })?;

        let environment = pipeline
            .run(Step::ReconcileEnvironment, || self.environments.reconcile(req))?
            .ok_or_else(|| missing_value(Step::ReconcileEnvironment))?;

        Ok(DeployReport {
            warnings: pipeline.warning_count(),
            records: pipeline.records().to_vec(),
            location,
            environment,
        })
    }
}

/// Required steps abort on failure, so a missing value means the policy table changed.
fn missing_value(step: Step) -> ApplicationError {
    ApplicationError::StepHalted {
        step,
        message: "step produced no value".into(),
    }
}
