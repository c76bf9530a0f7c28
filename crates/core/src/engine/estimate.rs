use rand::Rng;

const BASE_SUCCESS_PROBABILITY: f64 = 0.3;
const AUDIENCE_MATCH_LIFT: f64 = 0.5;
const SUCCESS_PROBABILITY_CEILING: f64 = 0.95;

const BASE_CONVERSION_RATE: f64 = 0.02;
const CONVERSION_RATE_LIFT: f64 = 0.03;

const REACH_BASE: f64 = 1_000_000.0;
const REACH_JITTER_MIN: f64 = 0.5;
const REACH_JITTER_MAX: f64 = 2.0;

// The floor models baseline viability; the ceiling keeps the engine from
// claiming near-certain success.
pub fn success_probability(audience_match: f64, trend_boost: f64) -> f64 {
    (BASE_SUCCESS_PROBABILITY + AUDIENCE_MATCH_LIFT * audience_match + trend_boost)
        .min(SUCCESS_PROBABILITY_CEILING)
}

pub fn estimated_cac(avg_cpc: f64, audience_match: f64) -> f64 {
    // audience_match >= 0 keeps the conversion rate at or above 0.02, so the
    // division is always safe.
    let conversion_rate = BASE_CONVERSION_RATE + CONVERSION_RATE_LIFT * audience_match;
    avg_cpc / conversion_rate
}

// Requires cac > 0, which estimated_cac guarantees for any positive CPC.
pub fn estimated_roas(customer_lifetime_value: f64, cac: f64, success_probability: f64) -> f64 {
    (customer_lifetime_value / cac) * success_probability
}

/// Reach is sampled, not derived: identical inputs may yield different
/// estimates. Callers own the RNG so tests can fix the seed.
pub fn estimated_reach(audience_match: f64, rng: &mut impl Rng) -> u64 {
    let jitter = rng.gen_range(REACH_JITTER_MIN..REACH_JITTER_MAX);
    (audience_match * REACH_BASE * jitter) as u64
}
