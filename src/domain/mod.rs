//! Domain layer: entities and reconciliation rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod platform;
pub mod remote;
pub mod request;

pub use entities::*;
pub use error::DomainError;
pub use platform::{select_platform, MatchTier, PlatformPreference};
pub use remote::{RemoteError, RemoteErrorKind, RemoteResult};
pub use request::{CleanupRequest, DeployRequest};
