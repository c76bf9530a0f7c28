pub mod remote;

use crate::domain::profile::BusinessProfile;

/// Optional trained success-probability model. When configured it overrides
/// the heuristic estimate; the heuristic remains the guaranteed fallback, so
/// an unavailable model never degrades availability.
#[async_trait::async_trait]
pub trait SuccessModel: Send + Sync {
    fn model_name(&self) -> &'static str;

    async fn predict_success(
        &self,
        profile: &BusinessProfile,
        platform_id: &str,
    ) -> anyhow::Result<f64>;
}
