use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformScore {
    pub platform: String,
    pub success_probability: f64,
    pub estimated_reach: u64,
    pub estimated_cac: f64,
    pub estimated_roas: f64,
    pub competition_level: CompetitionLevel,
    pub audience_match: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendations: Vec<PlatformScore>,
    pub dark_horse: Option<PlatformScore>,
    pub budget_allocation: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}
