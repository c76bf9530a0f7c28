use std::collections::BTreeMap;

use crate::domain::recommendation::PlatformScore;

/// The budget is split across the top five of the full ranking, even when
/// the caller asked for fewer (or zero) recommendations back.
pub const BUDGET_SPLIT_COUNT: usize = 5;

/// Proportional allocation by success probability, rounded to cents.
/// Independent rounding means the amounts may not sum exactly to the budget;
/// that drift is accepted, not corrected.
pub fn allocate(top: &[PlatformScore], total_budget: f64) -> BTreeMap<String, f64> {
    if top.is_empty() {
        return BTreeMap::new();
    }

    // Success probabilities are floored at 0.3, so the sum is never zero.
    let total_probability: f64 = top.iter().map(|s| s.success_probability).sum();

    let mut allocation = BTreeMap::new();
    for score in top {
        let weight = score.success_probability / total_probability;
        allocation.insert(score.platform.clone(), round_cents(total_budget * weight));
    }
    allocation
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
