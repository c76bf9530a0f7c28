use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessModel {
    #[serde(rename = "B2B")]
    B2b,
    #[serde(rename = "B2C")]
    B2c,
    #[serde(rename = "B2B2C")]
    B2b2c,
}

impl BusinessModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessModel::B2b => "B2B",
            BusinessModel::B2c => "B2C",
            BusinessModel::B2b2c => "B2B2C",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub industry: String,
    #[serde(default)]
    pub sub_industry: Option<String>,
    pub company_size: String,
    pub target_age_min: u32,
    pub target_age_max: u32,
    pub target_gender: Vec<String>,
    pub target_locations: Vec<String>,
    pub target_interests: Vec<String>,
    pub business_model: BusinessModel,
    pub avg_order_value: f64,
    pub customer_lifetime_value: f64,
    pub monthly_budget: f64,
    pub marketing_goal: String,
    #[serde(default)]
    pub competitors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub business_profile: BusinessProfile,
    #[serde(default = "default_include_dark_horse")]
    pub include_dark_horse: bool,
    #[serde(default = "default_num_recommendations")]
    pub num_recommendations: i32,
}

fn default_include_dark_horse() -> bool {
    true
}

fn default_num_recommendations() -> i32 {
    10
}

#[derive(Debug, Clone)]
pub struct ProfileValidationError {
    pub field: &'static str,
    pub detail: String,
}

impl fmt::Display for ProfileValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid request (field={}): {}", self.field, self.detail)
    }
}

impl std::error::Error for ProfileValidationError {}

impl RecommendationRequest {
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        let profile = &self.business_profile;

        if profile.target_age_min > profile.target_age_max {
            return Err(ProfileValidationError {
                field: "target_age_min",
                detail: format!(
                    "target_age_min {} exceeds target_age_max {}",
                    profile.target_age_min, profile.target_age_max
                ),
            });
        }

        if profile.monthly_budget < 0.0 {
            return Err(ProfileValidationError {
                field: "monthly_budget",
                detail: format!("must be non-negative (got {})", profile.monthly_budget),
            });
        }

        if self.num_recommendations < 0 {
            return Err(ProfileValidationError {
                field: "num_recommendations",
                detail: format!("must be non-negative (got {})", self.num_recommendations),
            });
        }

        Ok(())
    }
}
