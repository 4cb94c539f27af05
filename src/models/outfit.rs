use serde::{Deserialize, Serialize};

use super::Product;

pub const DEFAULT_OUTFIT_COUNT: usize = 5;
pub const MAX_OUTFIT_COUNT: usize = 10;

/// Optional styling constraints attached to a recommendation request
///
/// Season and occasion are stored trimmed and lowercased so they compare
/// directly against the catalog's attribute sets. The caller's spelling is
/// kept alongside for the results cache key, which preserves casing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub budget: Option<f64>,
    pub season: Option<String>,
    pub occasion: Option<String>,
    #[serde(skip)]
    pub season_as_given: Option<String>,
    #[serde(skip)]
    pub occasion_as_given: Option<String>,
}

impl Constraints {
    pub fn new(budget: Option<f64>, season: Option<&str>, occasion: Option<&str>) -> Self {
        Self {
            budget,
            season: normalize(season),
            occasion: normalize(occasion),
            season_as_given: trimmed(season),
            occasion_as_given: trimmed(occasion),
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize(value: Option<&str>) -> Option<String> {
    trimmed(value).map(|v| v.to_lowercase())
}

/// A validated recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub base_sku: String,
    pub constraints: Constraints,
    pub count: usize,
}

impl RecommendationRequest {
    pub fn new(base_sku: impl Into<String>, constraints: Constraints, count: usize) -> Self {
        Self {
            base_sku: base_sku.into(),
            constraints,
            count: count.clamp(1, MAX_OUTFIT_COUNT),
        }
    }
}

/// A scored outfit, snapshotting the products it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outfit {
    /// Content fingerprint; identity of the outfit and key of its rationale
    pub reco_id: String,
    pub top: Product,
    pub bottom: Product,
    pub footwear: Product,
    pub accessories: Vec<Product>,
    pub match_score: f64,
    pub total_price: f64,
    #[serde(default)]
    pub reasoning_fast: Vec<String>,
}

impl Outfit {
    /// Constituent products in slot order: top, bottom, footwear, accessories
    pub fn items(&self) -> impl Iterator<Item = &Product> {
        [&self.top, &self.bottom, &self.footwear]
            .into_iter()
            .chain(self.accessories.iter())
    }

    pub fn skus(&self) -> Vec<&str> {
        self.items().map(|p| p.sku.as_str()).collect()
    }
}

/// Natural-language explanation generated for an outfit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rationale {
    pub paragraph: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

impl Rationale {
    /// Whether a cached rationale carries anything worth serving
    pub fn is_servable(&self) -> bool {
        !self.paragraph.trim().is_empty() || !self.bullets.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RationaleStatus {
    Ready,
    Pending,
}

/// Outfit as returned to the client, with its rationale status
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedOutfit {
    #[serde(flatten)]
    pub outfit: Outfit,
    pub ai_reasoning_status: RationaleStatus,
    pub ai_reasoning: Option<Rationale>,
}

impl EnrichedOutfit {
    pub fn ready(outfit: Outfit, rationale: Rationale) -> Self {
        Self {
            outfit,
            ai_reasoning_status: RationaleStatus::Ready,
            ai_reasoning: Some(rationale),
        }
    }

    pub fn pending(outfit: Outfit) -> Self {
        Self {
            outfit,
            ai_reasoning_status: RationaleStatus::Pending,
            ai_reasoning: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub base_sku: String,
    pub cached: bool,
    pub latency_ms: u64,
    pub outfits: Vec<EnrichedOutfit>,
}
