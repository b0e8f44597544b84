//! Application and application-version registration

use std::sync::Arc;

use tracing::debug;

use crate::application::pipeline::StepOutcome;
use crate::domain::{BundleLocation, VersionLabel};
use crate::infrastructure::traits::CloudClient;

/// What `ensure` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    Existing,
    Created,
    /// Create failed; existence is unknown
    Unconfirmed,
}

/// Application registration service.
pub struct RegistrationService {
    cloud: Arc<dyn CloudClient>,
}

impl RegistrationService {
    pub fn new(cloud: Arc<dyn CloudClient>) -> Self {
        Self { cloud }
    }

    /// Ensure an application record named exactly `app` exists.
    ///
    /// A failed create is reported as a warning; the pipeline policy decides
    /// whether that stops the deploy.
    pub fn ensure_application(&self, app: &str) -> StepOutcome<RegistrationAction> {
        match self.cloud.application_exists(app) {
            Ok(true) => return StepOutcome::Success(RegistrationAction::Existing),
            Ok(false) => {}
            Err(e) => debug!("describe application {app} failed ({}), creating", e.kind),
        }

        match self.cloud.create_application(app) {
            Ok(()) => StepOutcome::Success(RegistrationAction::Created),
            Err(e) if e.is_conflict() => StepOutcome::Success(RegistrationAction::Existing),
            Err(e) => StepOutcome::SuccessWithWarning(
                RegistrationAction::Unconfirmed,
                format!("could not create application '{app}': {e}"),
            ),
        }
    }

    /// Create a version record for an uploaded bundle. No existence check.
    pub fn register_version(
        &self,
        app: &str,
        version: &VersionLabel,
        source: &BundleLocation,
    ) -> StepOutcome {
        self.cloud
            .create_application_version(app, version.as_str(), source)
            .into()
    }
}
