//! Environment reconciliation
//!
//! ```text
//! count(app, env) ──0──▶ ABSENT ──▶ resolve platform ──▶ create
//!        │
//!        └──>0──▶ PRESENT ──▶ update ──ok──▶ done
//!                               │
//!                               ├─no env────▶ resolve platform ──▶ create (once)
//!                               └─other─────▶ fatal
//! ```
//!
//! Success means the provider accepted the request; health is not awaited.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::pipeline::StepOutcome;
use crate::application::services::PlatformService;
use crate::domain::{
    environment_option_settings, DeployRequest, EnvironmentAction, EnvironmentState,
    OptionSetting,
};
use crate::infrastructure::traits::CloudClient;

/// Environment reconciliation service.
pub struct EnvironmentService {
    cloud: Arc<dyn CloudClient>,
    platform: PlatformService,
}

impl EnvironmentService {
    pub fn new(cloud: Arc<dyn CloudClient>) -> Self {
        Self {
            platform: PlatformService::new(cloud.clone()),
            cloud,
        }
    }

    /// Current state of the requested environment.
    pub fn state(&self, app: &str, env: &str) -> StepOutcome<EnvironmentState> {
        self.cloud
            .count_environments(app, env)
            .map(EnvironmentState::from_count)
            .into()
    }

    /// Update the environment in place or create it.
    pub fn reconcile(&self, req: &DeployRequest) -> StepOutcome<EnvironmentAction> {
        let options =
            environment_option_settings(&req.instance_profile, &req.service_role, req.port);

        let state = match self.state(&req.app, &req.env) {
            StepOutcome::Success(state) => state,
            StepOutcome::SuccessWithWarning(state, _) => state,
            StepOutcome::Fatal(e) => return StepOutcome::Fatal(e),
        };
        info!("environment {}/{}: {:?}", req.app, req.env, state);

        match state {
            EnvironmentState::Present => {
                match self.cloud.update_environment(
                    &req.app,
                    &req.env,
                    req.version.as_str(),
                    &options,
                ) {
                    Ok(()) => StepOutcome::Success(EnvironmentAction::Updated),
                    Err(e) if e.is_environment_missing() => {
                        warn!("environment {} disappeared during update, creating", req.env);
                        self.create(req, &options)
                            .map(|platform| EnvironmentAction::RecreatedAfterMissing { platform })
                    }
                    Err(e) => StepOutcome::Fatal(e.into()),
                }
            }
            EnvironmentState::Absent => self
                .create(req, &options)
                .map(|platform| EnvironmentAction::Created { platform }),
        }
    }

    /// Resolve a platform and create the environment. Returns the platform used.
    fn create(&self, req: &DeployRequest, options: &[OptionSetting]) -> StepOutcome<String> {
        let choice = self
            .platform
            .resolve(&req.platform_preference, &req.platform);
        self.cloud
            .create_environment(
                &req.app,
                &req.env,
                req.version.as_str(),
                &choice.name,
                options,
            )
            .map(|_| choice.name)
            .into()
    }
}
