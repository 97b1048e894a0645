use std::time::Duration;

use tracing::{info, warn};

use crate::profile::BackendProfile;
use crate::traits::{Backend, BackendError, Generation};

/// Run a generation, giving up after `limit`.
///
/// A timeout is reported as [`BackendError::Timeout`], the same as a
/// transport-level timeout.
pub async fn generate_within(
    backend: &dyn Backend,
    request: &Generation,
    limit: Duration,
) -> Result<String, BackendError> {
    match tokio::time::timeout(limit, backend.generate(request)).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout),
    }
}

/// Ask the strategic server for its model and derive a tuning profile.
///
/// Falls back to [`BackendProfile::unknown`] when the server cannot say.
pub async fn detect_profile(backend: &dyn Backend, limit: Duration) -> BackendProfile {
    match tokio::time::timeout(limit, backend.probe()).await {
        Ok(Ok(model)) => {
            let profile = BackendProfile::for_model(model);
            info!(
                model = %profile.model,
                family = ?profile.family,
                threshold = profile.escalation_threshold,
                cooldown = ?profile.cooldown,
                "strategic backend detected"
            );
            profile
        }
        Ok(Err(e)) => {
            warn!(error = %e, "strategic model detection failed");
            BackendProfile::unknown()
        }
        Err(_) => {
            warn!("strategic model detection timed out");
            BackendProfile::unknown()
        }
    }
}
