pub mod audience;
pub mod budget;
pub mod estimate;
pub mod rank;

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;

use crate::catalog::PlatformCatalog;
use crate::domain::profile::{BusinessProfile, RecommendationRequest};
use crate::domain::recommendation::{PlatformScore, RecommendationResult};
use crate::model::SuccessModel;
use crate::storage::cache::{fingerprint, ResultCache};

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Scores the full catalog for one request. Pure apart from the injected
/// RNG (reach sampling) and the optional model collaborator.
pub struct RecommendationEngine {
    catalog: Arc<PlatformCatalog>,
    model: Option<Arc<dyn SuccessModel>>,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<PlatformCatalog>, model: Option<Arc<dyn SuccessModel>>) -> Self {
        Self { catalog, model }
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
        rng: &mut StdRng,
    ) -> RecommendationResult {
        let profile = &request.business_profile;

        let mut scores = Vec::with_capacity(self.catalog.len());
        for (platform_id, platform) in self.catalog.platforms() {
            let audience_match = audience::audience_match(profile, platform);
            let success_probability = self
                .success_probability(profile, platform_id, audience_match, platform.trend_boost)
                .await;
            let estimated_cac = estimate::estimated_cac(platform.avg_cpc, audience_match);
            let estimated_roas = estimate::estimated_roas(
                profile.customer_lifetime_value,
                estimated_cac,
                success_probability,
            );

            scores.push(PlatformScore {
                platform: platform_id.to_string(),
                success_probability,
                estimated_reach: estimate::estimated_reach(audience_match, rng),
                estimated_cac,
                estimated_roas,
                competition_level: rank::competition_level(success_probability),
                audience_match,
                reasons: rank::reasons(audience_match, estimated_roas, platform.trend_boost),
            });
        }

        rank::sort_by_success(&mut scores);

        let dark_horse = if request.include_dark_horse && scores.len() > rank::DARK_HORSE_RANK {
            Some(scores[rank::DARK_HORSE_RANK].clone())
        } else {
            None
        };

        // The split always works from the unclamped top five, even when the
        // caller asked for fewer recommendations back.
        let top = &scores[..scores.len().min(budget::BUDGET_SPLIT_COUNT)];
        let budget_allocation = budget::allocate(top, profile.monthly_budget);

        let count = rank::clamp_count(request.num_recommendations, scores.len());
        scores.truncate(count);

        RecommendationResult {
            recommendations: scores,
            dark_horse,
            budget_allocation,
            created_at: Utc::now(),
        }
    }

    async fn success_probability(
        &self,
        profile: &BusinessProfile,
        platform_id: &str,
        audience_match: f64,
        trend_boost: f64,
    ) -> f64 {
        if let Some(model) = &self.model {
            match model.predict_success(profile, platform_id).await {
                Ok(probability) => return probability,
                Err(err) => {
                    tracing::warn!(
                        platform = platform_id,
                        model = model.model_name(),
                        error = %err,
                        "model prediction failed; using heuristic"
                    );
                }
            }
        }
        estimate::success_probability(audience_match, trend_boost)
    }
}

/// Request-facing wrapper: validation, cache short-circuit, computation,
/// fire-and-forget cache write.
pub struct RecommendationService {
    engine: RecommendationEngine,
    cache: Option<Arc<dyn ResultCache>>,
    cache_ttl_secs: u64,
}

impl RecommendationService {
    pub fn new(engine: RecommendationEngine, cache: Option<Arc<dyn ResultCache>>) -> Self {
        Self {
            engine,
            cache,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    pub fn with_cache_ttl(mut self, cache_ttl_secs: u64) -> Self {
        self.cache_ttl_secs = cache_ttl_secs;
        self
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
        rng: &mut StdRng,
    ) -> anyhow::Result<RecommendationResult> {
        request.validate()?;

        let cache_key = fingerprint(&request.user_id, &request.business_profile);
        if let Some(cached) = self.cached_result(&cache_key).await {
            return Ok(cached);
        }

        let result = self.engine.recommend(request, rng).await;

        if let Some(cache) = &self.cache {
            match serde_json::to_string(&result) {
                Ok(payload) => {
                    let cache = Arc::clone(cache);
                    let ttl_secs = self.cache_ttl_secs;
                    // Fire and forget: a failed write never fails the
                    // request that produced the result.
                    tokio::spawn(async move {
                        if let Err(err) = cache.set_expiring(&cache_key, ttl_secs, &payload).await
                        {
                            tracing::warn!(cache_key = %cache_key, error = %err, "cache write failed");
                        }
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize result for caching");
                }
            }
        }

        Ok(result)
    }

    async fn cached_result(&self, cache_key: &str) -> Option<RecommendationResult> {
        let cache = self.cache.as_ref()?;

        let payload = match cache.get(cache_key).await {
            Ok(hit) => hit?,
            Err(err) => {
                tracing::warn!(cache_key = %cache_key, error = %err, "cache unavailable; computing uncached");
                return None;
            }
        };

        match serde_json::from_str::<RecommendationResult>(&payload) {
            Ok(result) => {
                tracing::debug!(cache_key = %cache_key, "cache hit");
                Some(result)
            }
            Err(err) => {
                tracing::warn!(cache_key = %cache_key, error = %err, "discarding malformed cache entry");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlatformProfile;
    use crate::domain::profile::{BusinessModel, ProfileValidationError};
    use anyhow::bail;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    fn profile() -> BusinessProfile {
        BusinessProfile {
            industry: "retail".to_string(),
            sub_industry: None,
            company_size: "1-10".to_string(),
            target_age_min: 25,
            target_age_max: 35,
            target_gender: vec!["female".to_string()],
            target_locations: vec!["us".to_string()],
            target_interests: vec!["fashion".to_string()],
            business_model: BusinessModel::B2c,
            avg_order_value: 80.0,
            customer_lifetime_value: 600.0,
            monthly_budget: 5000.0,
            marketing_goal: "sales".to_string(),
            competitors: None,
        }
    }

    fn request(num_recommendations: i32, include_dark_horse: bool) -> RecommendationRequest {
        RecommendationRequest {
            user_id: "u_42".to_string(),
            business_profile: profile(),
            include_dark_horse,
            num_recommendations,
        }
    }

    // Synthetic catalog with strictly decreasing B2C affinity, so the
    // heuristic ranking follows catalog order and every probability is
    // distinct.
    fn catalog_of(n: usize) -> Arc<PlatformCatalog> {
        let order: Vec<String> = (0..n).map(|i| format!("platform_{i}")).collect();
        let entries = order
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let platform = PlatformProfile {
                    b2c_score: 1.0 - i as f64 / n as f64,
                    ..PlatformProfile::default()
                };
                (id.clone(), platform)
            })
            .collect();
        Arc::new(PlatformCatalog::new(order, entries))
    }

    fn engine(n: usize) -> RecommendationEngine {
        RecommendationEngine::new(catalog_of(n), None)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[tokio::test]
    async fn ranking_is_sorted_by_success_probability() {
        let result = engine(8).recommend(&request(8, true), &mut rng()).await;
        assert_eq!(result.recommendations.len(), 8);
        for pair in result.recommendations.windows(2) {
            assert!(pair[0].success_probability >= pair[1].success_probability);
        }
    }

    #[tokio::test]
    async fn dark_horse_is_the_sixth_of_the_full_ranking() {
        let full = engine(8).recommend(&request(8, true), &mut rng()).await;
        let expected = full.recommendations[5].platform.clone();
        assert_eq!(full.dark_horse.unwrap().platform, expected);

        // Slicing the returned list does not move the dark horse.
        let sliced = engine(8).recommend(&request(2, true), &mut rng()).await;
        assert_eq!(sliced.recommendations.len(), 2);
        assert_eq!(sliced.dark_horse.unwrap().platform, expected);
    }

    #[tokio::test]
    async fn dark_horse_is_absent_for_small_catalogs() {
        let result = engine(5).recommend(&request(5, true), &mut rng()).await;
        assert!(result.dark_horse.is_none());
    }

    #[tokio::test]
    async fn dark_horse_is_absent_when_not_requested() {
        let result = engine(8).recommend(&request(8, false), &mut rng()).await;
        assert!(result.dark_horse.is_none());
    }

    #[tokio::test]
    async fn zero_recommendations_still_allocate_and_pick_a_dark_horse() {
        let result = engine(8).recommend(&request(0, true), &mut rng()).await;
        assert!(result.recommendations.is_empty());
        assert_eq!(result.budget_allocation.len(), 5);
        assert!(result.dark_horse.is_some());
    }

    #[tokio::test]
    async fn oversized_requests_clamp_to_catalog_size() {
        let result = engine(8).recommend(&request(100, true), &mut rng()).await;
        assert_eq!(result.recommendations.len(), 8);
    }

    #[tokio::test]
    async fn budget_covers_the_top_five_of_the_full_ranking() {
        let result = engine(8).recommend(&request(3, true), &mut rng()).await;
        // Affinities decrease along the synthetic catalog, so the top five
        // are platform_0..platform_4.
        for i in 0..5 {
            assert!(result
                .budget_allocation
                .contains_key(&format!("platform_{i}")));
        }
        let total: f64 = result.budget_allocation.values().sum();
        assert!((total - 5000.0).abs() < 0.05, "got {total}");
    }

    #[tokio::test]
    async fn smaller_catalogs_allocate_across_everything() {
        let result = engine(3).recommend(&request(3, true), &mut rng()).await;
        assert_eq!(result.budget_allocation.len(), 3);
    }

    struct FixedModel(f64);

    #[async_trait::async_trait]
    impl SuccessModel for FixedModel {
        fn model_name(&self) -> &'static str {
            "fixed"
        }

        async fn predict_success(
            &self,
            _profile: &BusinessProfile,
            _platform_id: &str,
        ) -> anyhow::Result<f64> {
            Ok(self.0)
        }
    }

    struct BrokenModel;

    #[async_trait::async_trait]
    impl SuccessModel for BrokenModel {
        fn model_name(&self) -> &'static str {
            "broken"
        }

        async fn predict_success(
            &self,
            _profile: &BusinessProfile,
            _platform_id: &str,
        ) -> anyhow::Result<f64> {
            bail!("model offline")
        }
    }

    #[tokio::test]
    async fn configured_model_overrides_success_probability_only() {
        let with_model = RecommendationEngine::new(catalog_of(4), Some(Arc::new(FixedModel(0.42))));
        let result = with_model.recommend(&request(4, false), &mut rng()).await;
        for score in &result.recommendations {
            assert_eq!(score.success_probability, 0.42);
        }

        // Audience match is untouched by the override.
        let heuristic = engine(4).recommend(&request(4, false), &mut rng()).await;
        let matches =
            |r: &RecommendationResult| -> Vec<f64> {
                r.recommendations.iter().map(|s| s.audience_match).collect()
            };
        assert_eq!(matches(&result), matches(&heuristic));
    }

    #[tokio::test]
    async fn failing_model_falls_back_to_the_heuristic() {
        let with_model = RecommendationEngine::new(catalog_of(4), Some(Arc::new(BrokenModel)));
        let result = with_model.recommend(&request(4, false), &mut rng()).await;
        for score in &result.recommendations {
            let expected = estimate::success_probability(score.audience_match, 0.0);
            assert_eq!(score.success_probability, expected);
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait::async_trait]
    impl ResultCache for MemoryCache {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_expiring(
            &self,
            key: &str,
            _ttl_secs: u64,
            payload: &str,
        ) -> anyhow::Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), payload.to_string());
            Ok(())
        }
    }

    struct DownCache;

    #[async_trait::async_trait]
    impl ResultCache for DownCache {
        async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            bail!("cache down")
        }

        async fn set_expiring(
            &self,
            _key: &str,
            _ttl_secs: u64,
            _payload: &str,
        ) -> anyhow::Result<()> {
            bail!("cache down")
        }
    }

    fn service(n: usize, cache: Option<Arc<dyn ResultCache>>) -> RecommendationService {
        RecommendationService::new(RecommendationEngine::new(catalog_of(n), None), cache)
    }

    #[tokio::test]
    async fn validation_failures_reject_the_request() {
        let service = service(8, None);

        let mut bad_age = request(8, true);
        bad_age.business_profile.target_age_min = 50;
        bad_age.business_profile.target_age_max = 20;
        let err = service.recommend(&bad_age, &mut rng()).await.unwrap_err();
        assert!(err.downcast_ref::<ProfileValidationError>().is_some());

        let mut bad_count = request(8, true);
        bad_count.num_recommendations = -1;
        assert!(service.recommend(&bad_count, &mut rng()).await.is_err());
    }

    #[tokio::test]
    async fn well_formed_cache_hit_short_circuits_the_engine() {
        let cache = Arc::new(MemoryCache::default());
        let service = service(8, Some(cache.clone()));
        let request = request(8, true);

        let canned = RecommendationResult {
            recommendations: Vec::new(),
            dark_horse: None,
            budget_allocation: Default::default(),
            created_at: Utc::now(),
        };
        let key = fingerprint(&request.user_id, &request.business_profile);
        cache
            .set_expiring(&key, 60, &serde_json::to_string(&canned).unwrap())
            .await
            .unwrap();

        let got = service.recommend(&request, &mut rng()).await.unwrap();
        assert_eq!(got, canned);
    }

    #[tokio::test]
    async fn computed_results_are_written_back_byte_identically() {
        let cache = Arc::new(MemoryCache::default());
        let service = service(8, Some(cache.clone()));
        let request = request(8, true);
        let key = fingerprint(&request.user_id, &request.business_profile);

        let result = service.recommend(&request, &mut rng()).await.unwrap();

        // The write is spawned; poll until it lands.
        let mut stored = None;
        for _ in 0..100 {
            if let Some(payload) = cache.get(&key).await.unwrap() {
                stored = Some(payload);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let stored = stored.expect("cache write never landed");
        assert_eq!(stored, serde_json::to_string(&result).unwrap());

        // A second identical request replays the stored result exactly.
        let replay = service.recommend(&request, &mut rng()).await.unwrap();
        assert_eq!(serde_json::to_string(&replay).unwrap(), stored);
        assert_eq!(replay.created_at, result.created_at);
    }

    #[tokio::test]
    async fn malformed_cache_entries_are_recomputed() {
        let cache = Arc::new(MemoryCache::default());
        let service = service(8, Some(cache.clone()));
        let request = request(8, true);
        let key = fingerprint(&request.user_id, &request.business_profile);

        cache.set_expiring(&key, 60, "{not json").await.unwrap();

        let result = service.recommend(&request, &mut rng()).await.unwrap();
        assert_eq!(result.recommendations.len(), 8);
    }

    #[tokio::test]
    async fn unreachable_cache_never_fails_the_request() {
        let service = service(8, Some(Arc::new(DownCache)));
        let result = service.recommend(&request(8, true), &mut rng()).await;
        assert_eq!(result.unwrap().recommendations.len(), 8);
    }
}
