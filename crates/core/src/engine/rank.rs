use crate::domain::recommendation::{CompetitionLevel, PlatformScore};

const HIGH_PROBABILITY_THRESHOLD: f64 = 0.7;
const MEDIUM_PROBABILITY_THRESHOLD: f64 = 0.4;

const EXCELLENT_MATCH_THRESHOLD: f64 = 0.7;
const HIGH_ROAS_THRESHOLD: f64 = 3.0;
const MAX_REASONS: usize = 3;

/// The dark horse is always the sixth entry of the full ranking, regardless
/// of how many recommendations the caller asked for.
pub const DARK_HORSE_RANK: usize = 5;

pub fn competition_level(success_probability: f64) -> CompetitionLevel {
    if success_probability > HIGH_PROBABILITY_THRESHOLD {
        CompetitionLevel::High
    } else if success_probability > MEDIUM_PROBABILITY_THRESHOLD {
        CompetitionLevel::Medium
    } else {
        CompetitionLevel::Low
    }
}

/// Human-readable rationale, in fixed priority order, capped at three.
pub fn reasons(audience_match: f64, estimated_roas: f64, trend_boost: f64) -> Vec<String> {
    let mut reasons = Vec::new();
    if audience_match > EXCELLENT_MATCH_THRESHOLD {
        reasons.push(format!(
            "Excellent audience match ({}%)",
            (audience_match * 100.0) as u32
        ));
    }
    if estimated_roas > HIGH_ROAS_THRESHOLD {
        reasons.push("High potential ROAS".to_string());
    }
    if trend_boost > 0.0 {
        reasons.push("Growing platform engagement".to_string());
    }
    reasons.truncate(MAX_REASONS);
    reasons
}

/// Descending by success probability. The sort is stable, so equal
/// probabilities keep catalog order.
pub fn sort_by_success(scores: &mut [PlatformScore]) {
    scores.sort_by(|a, b| b.success_probability.total_cmp(&a.success_probability));
}

pub fn clamp_count(requested: i32, catalog_size: usize) -> usize {
    usize::try_from(requested).unwrap_or(0).min(catalog_size)
}
