//! Application services
//!
//! Concrete services, one per reconciled resource, plus the two workflows
//! that sequence them. Services depend on I/O boundary traits
//! (CloudClient, FileSystem, Clock, Prompter) but are themselves concrete
//! structs, not traits.

mod artifact;
mod bucket;
mod cleanup;
mod deploy;
mod environment;
mod platform;
mod registration;
mod roles;

pub use artifact::{zip_single_entry, ArtifactService, PackagedArtifact};
pub use bucket::{location_constraint, BucketAction, BucketService};
pub use cleanup::{
    CleanupReport, CleanupService, Termination, TERMINATION_POLL_INTERVAL, TERMINATION_TIMEOUT,
};
pub use deploy::{DeployReport, DeployWorkflow};
pub use environment::EnvironmentService;
pub use platform::{PlatformChoice, PlatformService};
pub use registration::{RegistrationAction, RegistrationService};
pub use roles::{
    trust_policy, RoleAction, RoleService, BEANSTALK_PRINCIPAL, EC2_PRINCIPAL,
    INSTANCE_POLICY_ARN, INSTANCE_PROFILE_PROPAGATION, SERVICE_POLICY_ARN,
    SERVICE_ROLE_PROPAGATION,
};
