//! Tests for RoleService

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{remote, FakeClock, MockCloud};
use ebdeploy::application::services::{
    RoleAction, RoleService, INSTANCE_POLICY_ARN, INSTANCE_PROFILE_PROPAGATION,
    SERVICE_POLICY_ARN, SERVICE_ROLE_PROPAGATION,
};
use ebdeploy::application::StepOutcome;
use ebdeploy::domain::RemoteErrorKind;

const PROFILE: &str = "aws-elasticbeanstalk-ec2-role";
const SERVICE_ROLE: &str = "aws-elasticbeanstalk-service-role";

#[test]
fn given_existing_instance_profile_when_ensure_then_nothing_created() {
    // Arrange
    let cloud = Arc::new(MockCloud::new().with_instance_profiles(&[PROFILE]));
    let clock = Arc::new(FakeClock::new());
    let service = RoleService::new(cloud.clone(), clock.clone());

    // Act
    let outcome = service.ensure_instance_profile(PROFILE);

    // Assert
    assert!(matches!(outcome, StepOutcome::Success(RoleAction::Existing)));
    assert!(cloud.mutations().is_empty());
    assert!(clock.sleeps().is_empty());
}

#[test]
fn given_missing_instance_profile_when_ensure_then_role_policy_and_profile_created() {
    // Arrange
    let cloud = Arc::new(MockCloud::new());
    let clock = Arc::new(FakeClock::new());
    let service = RoleService::new(cloud.clone(), clock.clone());

    // Act
    let outcome = service.ensure_instance_profile(PROFILE);

    // Assert
    assert!(matches!(outcome, StepOutcome::Success(RoleAction::Created)));
    assert_eq!(
        cloud.mutations(),
        vec![
            format!("create_role {PROFILE}"),
            format!("attach_role_policy {PROFILE} {INSTANCE_POLICY_ARN}"),
            format!("create_instance_profile {PROFILE}"),
            format!("add_role_to_instance_profile {PROFILE} {PROFILE}"),
        ]
    );
    // visible on the first check: no waiting
    assert!(clock.sleeps().is_empty());
}

#[test]
fn given_created_role_never_visible_when_ensure_then_backoff_bounded_by_budget() {
    // Arrange
    let cloud = Arc::new(MockCloud {
        identity_hidden: true,
        ..MockCloud::new()
    });
    let clock = Arc::new(FakeClock::new());
    let service = RoleService::new(cloud.clone(), clock.clone());

    // Act
    let outcome = service.ensure_service_role(SERVICE_ROLE);

    // Assert
    assert!(matches!(
        outcome,
        StepOutcome::SuccessWithWarning(RoleAction::Created, _)
    ));
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(2)
        ]
    );
    assert_eq!(clock.elapsed(), SERVICE_ROLE_PROPAGATION);
}

#[test]
fn given_profile_never_visible_when_ensure_then_waits_full_budget() {
    // Arrange
    let cloud = Arc::new(MockCloud {
        identity_hidden: true,
        ..MockCloud::new()
    });
    let clock = Arc::new(FakeClock::new());
    let service = RoleService::new(cloud, clock.clone());

    // Act
    let outcome = service.ensure_instance_profile(PROFILE);

    // Assert
    assert!(matches!(outcome, StepOutcome::SuccessWithWarning(..)));
    assert_eq!(clock.elapsed(), INSTANCE_PROFILE_PROPAGATION);
}

#[test]
fn given_missing_service_role_when_ensure_then_created_with_health_policy() {
    // Arrange
    let cloud = Arc::new(MockCloud::new());
    let clock = Arc::new(FakeClock::new());
    let service = RoleService::new(cloud.clone(), clock);

    // Act
    let outcome = service.ensure_service_role(SERVICE_ROLE);

    // Assert
    assert!(matches!(outcome, StepOutcome::Success(RoleAction::Created)));
    assert_eq!(
        cloud.mutations(),
        vec![
            format!("create_role {SERVICE_ROLE}"),
            format!("attach_role_policy {SERVICE_ROLE} {SERVICE_POLICY_ARN}"),
        ]
    );
}

#[test]
fn given_role_already_exists_conflict_when_ensure_then_treated_as_progress() {
    // Arrange
    let cloud = Arc::new(MockCloud {
        create_role_error: Some(remote(
            RemoteErrorKind::Conflict,
            "iam create-role",
            "EntityAlreadyExists: Role with name already exists.",
        )),
        ..MockCloud::new()
    });
    let clock = Arc::new(FakeClock::new());
    let service = RoleService::new(cloud.clone(), clock);

    // Act
    let outcome = service.ensure_service_role(SERVICE_ROLE);

    // Assert
    assert!(!matches!(outcome, StepOutcome::Fatal(_)));
    assert_eq!(cloud.count("attach_role_policy"), 1);
}

#[test]
fn given_create_role_denied_when_ensure_then_warning_not_fatal() {
    // Arrange
    let cloud = Arc::new(MockCloud {
        create_role_error: Some(remote(
            RemoteErrorKind::Unknown,
            "iam create-role",
            "AccessDenied",
        )),
        ..MockCloud::new()
    });
    let clock = Arc::new(FakeClock::new());
    let service = RoleService::new(cloud.clone(), clock);

    // Act
    let outcome = service.ensure_instance_profile(PROFILE);

    // Assert
    assert!(matches!(
        outcome,
        StepOutcome::SuccessWithWarning(RoleAction::Unconfirmed, _)
    ));
    assert_eq!(cloud.count("create_instance_profile"), 0);
}
