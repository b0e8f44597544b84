//! Platform descriptor resolution (only used when creating an environment)

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{select_platform, MatchTier, PlatformPreference};
use crate::infrastructure::traits::CloudClient;

/// Chosen platform and how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformChoice {
    pub name: String,
    /// `None` when the configured default was used
    pub tier: Option<MatchTier>,
}

/// Platform resolution service.
pub struct PlatformService {
    cloud: Arc<dyn CloudClient>,
}

impl PlatformService {
    pub fn new(cloud: Arc<dyn CloudClient>) -> Self {
        Self { cloud }
    }

    /// Pick a platform from the provider's listing, or fall back to `default`.
    pub fn resolve(&self, pref: &PlatformPreference, default: &str) -> PlatformChoice {
        let fallback = || PlatformChoice {
            name: default.to_string(),
            tier: None,
        };

        let stacks = match self.cloud.list_solution_stacks() {
            Ok(stacks) => stacks,
            Err(e) => {
                warn!("cannot list platforms ({e}); using default '{default}'");
                return fallback();
            }
        };
        debug!("{} platforms available", stacks.len());

        match select_platform(&stacks, pref) {
            Some((name, tier)) => {
                debug!("platform '{name}' selected ({tier:?})");
                PlatformChoice {
                    name: name.to_string(),
                    tier: Some(tier),
                }
            }
            None => {
                warn!(
                    "no {} platform available; using default '{default}'",
                    pref.runtime_family
                );
                fallback()
            }
        }
    }
}
