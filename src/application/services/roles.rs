//! Identity role reconciliation
//!
//! Two independent paths:
//! - instance profile: EC2 role + web-tier policy, wrapped in an instance profile
//! - service role: Elastic Beanstalk role + enhanced-health policy
//!
//! Failures are warnings: the environment step may still succeed when the
//! configured names already exist. After creating, the identity service is
//! polled with exponential backoff until the resource is visible or the
//! propagation budget is spent.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info};

use crate::application::pipeline::StepOutcome;
use crate::domain::RemoteResult;
use crate::infrastructure::traits::{Clock, CloudClient};

pub const EC2_PRINCIPAL: &str = "ec2.amazonaws.com";
pub const BEANSTALK_PRINCIPAL: &str = "elasticbeanstalk.amazonaws.com";
pub const INSTANCE_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AWSElasticBeanstalkWebTier";
pub const SERVICE_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSElasticBeanstalkEnhancedHealth";

pub const INSTANCE_PROFILE_PROPAGATION: Duration = Duration::from_secs(10);
pub const SERVICE_ROLE_PROPAGATION: Duration = Duration::from_secs(5);
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// What a role path did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    Existing,
    Created,
    Unconfirmed,
}

/// Trust policy letting `principal` assume the role.
pub fn trust_policy(principal: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": principal },
            "Action": "sts:AssumeRole"
        }]
    })
    .to_string()
}

/// Treat "already exists" as progress.
fn tolerate_conflict(result: RemoteResult<()>) -> RemoteResult<()> {
    match result {
        Err(e) if e.is_conflict() => {
            debug!("{} (already exists)", e.operation);
            Ok(())
        }
        other => other,
    }
}

/// Identity role service.
pub struct RoleService {
    cloud: Arc<dyn CloudClient>,
    clock: Arc<dyn Clock>,
}

impl RoleService {
    pub fn new(cloud: Arc<dyn CloudClient>, clock: Arc<dyn Clock>) -> Self {
        Self { cloud, clock }
    }

    /// Ensure the instance profile `name` exists, holding a role of the same name.
    pub fn ensure_instance_profile(&self, name: &str) -> StepOutcome<RoleAction> {
        match self.cloud.instance_profile_exists(name) {
            Ok(true) => return StepOutcome::Success(RoleAction::Existing),
            Ok(false) => info!("instance profile {name} not found, creating"),
            Err(e) => debug!("get instance profile {name} failed ({}), creating", e.kind),
        }

        let created = tolerate_conflict(self.cloud.create_role(name, &trust_policy(EC2_PRINCIPAL)))
            .and_then(|_| tolerate_conflict(self.cloud.attach_role_policy(name, INSTANCE_POLICY_ARN)))
            .and_then(|_| tolerate_conflict(self.cloud.create_instance_profile(name)))
            .and_then(|_| tolerate_conflict(self.cloud.add_role_to_instance_profile(name, name)));
        if let Err(e) = created {
            return StepOutcome::SuccessWithWarning(
                RoleAction::Unconfirmed,
                format!("could not create instance profile '{name}': {e}"),
            );
        }

        if self.wait_until_visible(INSTANCE_PROFILE_PROPAGATION, || {
            self.cloud.instance_profile_exists(name)
        }) {
            StepOutcome::Success(RoleAction::Created)
        } else {
            StepOutcome::SuccessWithWarning(
                RoleAction::Created,
                format!(
                    "instance profile '{name}' created but not visible after {}s",
                    INSTANCE_PROFILE_PROPAGATION.as_secs()
                ),
            )
        }
    }

    /// Ensure the service role `name` exists.
    pub fn ensure_service_role(&self, name: &str) -> StepOutcome<RoleAction> {
        match self.cloud.role_exists(name) {
            Ok(true) => return StepOutcome::Success(RoleAction::Existing),
            Ok(false) => info!("service role {name} not found, creating"),
            Err(e) => debug!("get role {name} failed ({}), creating", e.kind),
        }

        let created = tolerate_conflict(
            self.cloud
                .create_role(name, &trust_policy(BEANSTALK_PRINCIPAL)),
        )
        .and_then(|_| tolerate_conflict(self.cloud.attach_role_policy(name, SERVICE_POLICY_ARN)));
        if let Err(e) = created {
            return StepOutcome::SuccessWithWarning(
                RoleAction::Unconfirmed,
                format!("could not create service role '{name}': {e}"),
            );
        }

        if self.wait_until_visible(SERVICE_ROLE_PROPAGATION, || self.cloud.role_exists(name)) {
            StepOutcome::Success(RoleAction::Created)
        } else {
            StepOutcome::SuccessWithWarning(
                RoleAction::Created,
                format!(
                    "service role '{name}' created but not visible after {}s",
                    SERVICE_ROLE_PROPAGATION.as_secs()
                ),
            )
        }
    }

    /// Poll `check` with doubling delays until it reports `true` or `budget` is spent.
    fn wait_until_visible(
        &self,
        budget: Duration,
        check: impl Fn() -> RemoteResult<bool>,
    ) -> bool {
        let start = self.clock.now();
        let mut delay = INITIAL_BACKOFF;
        loop {
            if matches!(check(), Ok(true)) {
                return true;
            }
            let elapsed = self.clock.now().saturating_duration_since(start);
            if elapsed >= budget {
                return false;
            }
            self.clock.sleep(delay.min(budget - elapsed));
            delay *= 2;
        }
    }
}
