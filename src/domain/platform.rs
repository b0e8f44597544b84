//! Platform (solution stack) selection
//!
//! Preference order over the provider's listing:
//! 1. exact runtime match, e.g. `Corretto 17`
//! 2. runtime family on one of the preferred OS images (in preference order)
//! 3. any stack mentioning the runtime family
//! 4. nothing, caller falls back to the configured default

use serde::{Deserialize, Serialize};

/// Which runtime to look for when creating an environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlatformPreference {
    /// Runtime family, e.g. "Corretto"
    pub runtime_family: String,
    /// Runtime major version, e.g. "17"
    pub runtime_version: String,
    /// OS base images accepted for a family-only match, most preferred first
    pub os_images: Vec<String>,
}

impl Default for PlatformPreference {
    fn default() -> Self {
        Self {
            runtime_family: "Corretto".into(),
            runtime_version: "17".into(),
            os_images: vec!["Amazon Linux 2023".into(), "Amazon Linux 2".into()],
        }
    }
}

/// How a stack was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    ExactRuntime,
    FamilyOnPreferredOs,
    FamilyOnly,
}

/// Pick a stack from `available` according to `pref`.
pub fn select_platform<'a>(
    available: &'a [String],
    pref: &PlatformPreference,
) -> Option<(&'a str, MatchTier)> {
    let exact = format!("{} {}", pref.runtime_family, pref.runtime_version);
    if let Some(stack) = available.iter().find(|s| s.contains(&exact)) {
        return Some((stack, MatchTier::ExactRuntime));
    }

    for os in &pref.os_images {
        if let Some(stack) = available
            .iter()
            .find(|s| s.contains(&pref.runtime_family) && s.contains(os.as_str()))
        {
            return Some((stack, MatchTier::FamilyOnPreferredOs));
        }
    }

    available
        .iter()
        .find(|s| s.contains(&pref.runtime_family))
        .map(|s| (s.as_str(), MatchTier::FamilyOnly))
}
