//! Storage bucket reconciliation

use std::sync::Arc;

use tracing::debug;

use crate::application::pipeline::StepOutcome;
use crate::config::DEFAULT_REGION;
use crate::infrastructure::traits::CloudClient;

/// What `ensure` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketAction {
    Existing,
    Created,
}

/// Location constraint to send on create: none for the default region.
pub fn location_constraint(region: &str) -> Option<&str> {
    if region == DEFAULT_REGION {
        None
    } else {
        Some(region)
    }
}

/// Bucket reconciliation service.
pub struct BucketService {
    cloud: Arc<dyn CloudClient>,
}

impl BucketService {
    pub fn new(cloud: Arc<dyn CloudClient>) -> Self {
        Self { cloud }
    }

    /// Ensure `bucket` exists in `region`.
    ///
    /// Check with head-bucket first; create only when that fails, then block on the
    /// provider's exists-waiter. Create and wait failures are fatal.
    pub fn ensure(&self, bucket: &str, region: &str) -> StepOutcome<BucketAction> {
        match self.cloud.head_bucket(bucket) {
            Ok(()) => return StepOutcome::Success(BucketAction::Existing),
            Err(e) => debug!("bucket {bucket} not confirmed ({}), creating", e.kind),
        }

        if let Err(e) = self
            .cloud
            .create_bucket(bucket, region, location_constraint(region))
        {
            return StepOutcome::Fatal(e.into());
        }
        if let Err(e) = self.cloud.wait_bucket_exists(bucket) {
            return StepOutcome::Fatal(e.into());
        }
        StepOutcome::Success(BucketAction::Created)
    }
}
