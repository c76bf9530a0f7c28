use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The canonical platform universe, fixed at design time. Every request is
/// scored against all of these, in this order.
pub const CANONICAL_PLATFORMS: [&str; 18] = [
    "google_ads",
    "facebook",
    "instagram",
    "linkedin",
    "tiktok",
    "twitter",
    "pinterest",
    "snapchat",
    "reddit",
    "youtube",
    "amazon_ads",
    "microsoft_ads",
    "spotify",
    "twitch",
    "industry_blogs",
    "newsletters",
    "podcasts",
    "ctv_ott",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub age_min: u32,
    pub age_max: u32,
    pub genders: BTreeSet<String>,
    pub interests: BTreeSet<String>,
    pub avg_cpc: f64,
    pub b2b_score: f64,
    pub b2c_score: f64,
    pub trend_boost: f64,
}

impl Default for PlatformProfile {
    // Neutral profile used for platforms with no reference data on file.
    fn default() -> Self {
        Self {
            age_min: 18,
            age_max: 65,
            genders: BTreeSet::new(),
            interests: BTreeSet::new(),
            avg_cpc: 2.0,
            b2b_score: 0.0,
            b2c_score: 0.0,
            trend_boost: 0.0,
        }
    }
}

pub struct PlatformCatalog {
    order: Vec<String>,
    entries: HashMap<String, PlatformProfile>,
    default_profile: PlatformProfile,
}

impl PlatformCatalog {
    pub fn new(order: Vec<String>, entries: HashMap<String, PlatformProfile>) -> Self {
        Self {
            order,
            entries,
            default_profile: PlatformProfile::default(),
        }
    }

    // The canonical identifier list plus the reference data currently on
    // file.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();

        entries.insert(
            "linkedin".to_string(),
            PlatformProfile {
                age_min: 25,
                age_max: 55,
                genders: string_set(&["male", "female"]),
                interests: string_set(&["b2b", "professional", "career"]),
                avg_cpc: 5.26,
                b2b_score: 0.95,
                b2c_score: 0.3,
                trend_boost: 0.15,
            },
        );

        entries.insert(
            "tiktok".to_string(),
            PlatformProfile {
                age_min: 16,
                age_max: 30,
                genders: string_set(&["male", "female"]),
                interests: string_set(&["entertainment", "music", "dance", "trends"]),
                avg_cpc: 1.95,
                b2b_score: 0.1,
                b2c_score: 0.9,
                trend_boost: 0.25,
            },
        );

        // Pinterest has growth-trend data only; its demographics stay neutral.
        entries.insert(
            "pinterest".to_string(),
            PlatformProfile {
                trend_boost: 0.1,
                ..PlatformProfile::default()
            },
        );

        Self::new(
            CANONICAL_PLATFORMS.iter().map(|s| s.to_string()).collect(),
            entries,
        )
    }

    /// Missing reference data resolves to the neutral default profile; a
    /// platform in the canonical list is always scorable.
    pub fn lookup(&self, platform_id: &str) -> &PlatformProfile {
        self.entries
            .get(platform_id)
            .unwrap_or(&self.default_profile)
    }

    pub fn platforms(&self) -> impl Iterator<Item = (&str, &PlatformProfile)> {
        self.order.iter().map(|id| (id.as_str(), self.lookup(id)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn string_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}
