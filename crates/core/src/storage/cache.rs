use anyhow::Context;
use sha2::{Digest, Sha256};

use crate::domain::profile::BusinessProfile;

/// Best-effort expiring key/value store for serialized recommendation
/// results. Failures are the caller's to log; they must never fail the
/// request that produced the result.
#[async_trait::async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set_expiring(&self, key: &str, ttl_secs: u64, payload: &str) -> anyhow::Result<()>;
}

/// Cache key for a user/profile pair. Fingerprints the profile content, not
/// the request flags: num_recommendations and the dark-horse switch only
/// slice a superset, so they share one entry. Set-valued fields are sorted
/// first, making the digest independent of submission order.
pub fn fingerprint(user_id: &str, profile: &BusinessProfile) -> String {
    let mut hasher = Sha256::new();

    push(&mut hasher, &profile.industry);
    push(&mut hasher, profile.sub_industry.as_deref().unwrap_or(""));
    push(&mut hasher, &profile.company_size);
    push(&mut hasher, &profile.target_age_min.to_string());
    push(&mut hasher, &profile.target_age_max.to_string());
    push_set(&mut hasher, &profile.target_gender);
    push_set(&mut hasher, &profile.target_locations);
    push_set(&mut hasher, &profile.target_interests);
    push(&mut hasher, profile.business_model.as_str());
    push(&mut hasher, &profile.avg_order_value.to_string());
    push(&mut hasher, &profile.customer_lifetime_value.to_string());
    push(&mut hasher, &profile.monthly_budget.to_string());
    push(&mut hasher, &profile.marketing_goal);
    push_set(&mut hasher, profile.competitors.as_deref().unwrap_or(&[]));

    format!("rec_{}_{:x}", user_id, hasher.finalize())
}

fn push(hasher: &mut Sha256, value: &str) {
    hasher.update(value.as_bytes());
    hasher.update([0x1f]);
}

fn push_set(hasher: &mut Sha256, values: &[String]) {
    let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    for value in sorted {
        push(hasher, value);
    }
    hasher.update([0x1e]);
}

#[derive(Debug, Clone)]
pub struct PostgresResultCache {
    pool: sqlx::PgPool,
}

impl PostgresResultCache {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ResultCache for PostgresResultCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT payload FROM recommendation_cache \
             WHERE cache_key = $1 AND expires_at > now() \
             LIMIT 1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("cache lookup failed")?;

        Ok(row.map(|(payload,)| payload))
    }

    async fn set_expiring(&self, key: &str, ttl_secs: u64, payload: &str) -> anyhow::Result<()> {
        let entry_id: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO recommendation_cache (cache_key, payload, expires_at) \
             VALUES ($1, $2, now() + make_interval(secs => $3)) \
             ON CONFLICT (cache_key) DO UPDATE \
             SET payload = EXCLUDED.payload, expires_at = EXCLUDED.expires_at \
             RETURNING id",
        )
        .bind(key)
        .bind(payload)
        .bind(ttl_secs as f64)
        .fetch_one(&self.pool)
        .await
        .context("cache write failed")?;

        tracing::debug!(cache_key = %key, %entry_id, ttl_secs, "cached recommendation result");
        Ok(())
    }
}
