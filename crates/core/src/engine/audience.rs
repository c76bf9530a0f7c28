use std::collections::BTreeSet;

use crate::catalog::PlatformProfile;
use crate::domain::profile::{BusinessModel, BusinessProfile};

const AGE_WEIGHT: f64 = 0.3;
const GENDER_WEIGHT: f64 = 0.2;
const INTEREST_WEIGHT: f64 = 0.3;
const BUSINESS_MODEL_WEIGHT: f64 = 0.2;

/// Affinity between a business's target audience and a platform's typical
/// user base, in [0, 1]. Deterministic for identical inputs.
pub fn audience_match(profile: &BusinessProfile, platform: &PlatformProfile) -> f64 {
    let mut score = 0.0;

    // Age: full weight when the target midpoint falls inside the platform's
    // demographic range, none otherwise.
    let target_age = (f64::from(profile.target_age_min) + f64::from(profile.target_age_max)) / 2.0;
    if target_age >= f64::from(platform.age_min) && target_age <= f64::from(platform.age_max) {
        score += AGE_WEIGHT;
    }

    let target_genders: BTreeSet<&str> =
        profile.target_gender.iter().map(String::as_str).collect();
    if !platform.genders.is_empty() {
        let overlap = target_genders
            .iter()
            .filter(|g| platform.genders.contains(**g))
            .count();
        if overlap > 0 {
            score += GENDER_WEIGHT * overlap as f64 / platform.genders.len() as f64;
        }
    }

    let target_interests: BTreeSet<&str> =
        profile.target_interests.iter().map(String::as_str).collect();
    if !platform.interests.is_empty() && !target_interests.is_empty() {
        let overlap = target_interests
            .iter()
            .filter(|i| platform.interests.contains(**i))
            .count();
        score += INTEREST_WEIGHT * overlap as f64 / platform.interests.len() as f64;
    }

    let affinity = match profile.business_model {
        BusinessModel::B2b => platform.b2b_score,
        _ => platform.b2c_score,
    };
    score += BUSINESS_MODEL_WEIGHT * affinity;

    // The four weights sum to 1.0; the clamp only matters if they are ever
    // retuned.
    score.min(1.0)
}
