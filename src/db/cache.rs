use std::fmt::Display;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::RecommendationRequest;

/// Generated outfit sets expire after 20 minutes
pub const RESULTS_TTL_SECS: u64 = 20 * 60;
/// Rationale entries expire after 3 days
pub const RATIONALE_TTL_SECS: u64 = 3 * 24 * 60 * 60;

const BUDGET_BUCKET: f64 = 500.0;

/// Rounds a budget to the nearest 500-unit band
pub fn budget_bucket(budget: f64) -> i64 {
    (budget / BUDGET_BUCKET).round() as i64 * BUDGET_BUCKET as i64
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    Recommendations {
        base_sku: String,
        budget: Option<f64>,
        season: Option<String>,
        occasion: Option<String>,
        count: usize,
    },
    /// Keyed by outfit fingerprint
    Rationale(String),
}

impl CacheKey {
    pub fn recommendations(request: &RecommendationRequest) -> Self {
        CacheKey::Recommendations {
            base_sku: request.base_sku.clone(),
            budget: request.constraints.budget,
            season: request.constraints.season_as_given.clone(),
            occasion: request.constraints.occasion_as_given.clone(),
            count: request.count,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations {
                base_sku,
                budget,
                season,
                occasion,
                count,
            } => {
                let bucket = budget
                    .map(|b| budget_bucket(b).to_string())
                    .unwrap_or_else(|| "na".to_string());
                write!(
                    f,
                    "reco:v2:{}:b{}:s{}:o{}:c{}",
                    base_sku,
                    bucket,
                    season.as_deref().unwrap_or("na"),
                    occasion.as_deref().unwrap_or("na"),
                    count
                )
            }
            CacheKey::Rationale(fingerprint) => write!(f, "ai:v2:{}", fingerprint),
        }
    }
}

/// String key/value store with per-entry expiry
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Typed JSON cache over a [`CacheBackend`]
///
/// Values are stored as JSON strings. Writes are awaited, so a value is
/// readable by the next request as soon as `set` returns.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Retrieves and deserializes a cached value
    ///
    /// An entry that no longer deserializes is deleted and reported as a miss.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let key = key.to_string();
        let Some(json) = self.backend.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Purging corrupt cache entry");
                self.backend.delete(&key).await?;
                Ok(None)
            }
        }
    }

    /// Writes a value and waits for the backend to confirm it
    pub async fn set<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.backend.set_ex(&key.to_string(), &json, ttl).await
    }

    /// Deletes an entry
    ///
    /// Used to purge a stored value that is readable but no longer usable,
    /// such as a rationale that fails validation. Deleting a missing key is
    /// not an error.
    pub async fn invalidate(&self, key: &CacheKey) -> AppResult<()> {
        self.backend.delete(&key.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryBackend;
    use crate::models::{Constraints, Rationale};

    fn reco_key(budget: Option<f64>, season: Option<&str>, occasion: Option<&str>) -> CacheKey {
        let request = RecommendationRequest::new("T1", Constraints::new(budget, season, occasion), 5);
        CacheKey::recommendations(&request)
    }

    #[test]
    fn test_budget_bucket() {
        assert_eq!(budget_bucket(2000.0), 2000);
        assert_eq!(budget_bucket(2240.0), 2000);
        assert_eq!(budget_bucket(2250.0), 2500);
        assert_eq!(budget_bucket(100.0), 0);
    }

    #[test]
    fn test_cache_key_display_recommendations() {
        let key = reco_key(Some(2100.0), Some("Summer"), Some("casual"));
        assert_eq!(key.to_string(), "reco:v2:T1:b2000:sSummer:ocasual:c5");
    }

    #[test]
    fn test_cache_key_keeps_caller_casing() {
        let lower = reco_key(None, Some("summer"), Some(" Casual "));
        let upper = reco_key(None, Some("SUMMER"), Some("Casual"));
        assert_eq!(lower.to_string(), "reco:v2:T1:bna:ssummer:oCasual:c5");
        assert_eq!(upper.to_string(), "reco:v2:T1:bna:sSUMMER:oCasual:c5");
    }

    #[test]
    fn test_cache_key_display_unconstrained() {
        let key = reco_key(None, None, None);
        assert_eq!(key.to_string(), "reco:v2:T1:bna:sna:ona:c5");
    }

    #[test]
    fn test_budgets_in_same_band_share_key() {
        let a = reco_key(Some(1900.0), None, None);
        let b = reco_key(Some(2200.0), None, None);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_cache_key_display_rationale() {
        let key = CacheKey::Rationale("abc123".to_string());
        assert_eq!(key.to_string(), "ai:v2:abc123");
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = Cache::new(Arc::new(MemoryBackend::new()));
        let key = CacheKey::Rationale("missing".to_string());
        let retrieved: Option<Rationale> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    async fn test_set_is_visible_immediately() {
        let cache = Cache::new(Arc::new(MemoryBackend::new()));

        let key = reco_key(None, None, None);
        let value = vec!["a".to_string(), "b".to_string()];
        cache.set(&key, &value, 60).await.unwrap();

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_purged() {
        let backend = Arc::new(MemoryBackend::new());
        let cache = Cache::new(backend.clone());
        let key = CacheKey::Rationale("fp".to_string());
        backend.set_ex(&key.to_string(), "{not json", 60).await.unwrap();

        let retrieved: Option<Rationale> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, None);
        assert_eq!(backend.get(&key.to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_invalidate() {
        let cache = Cache::new(Arc::new(MemoryBackend::new()));
        let key = CacheKey::Rationale("fp".to_string());
        let rationale = Rationale {
            paragraph: "A relaxed pairing for warm weekends.".to_string(),
            bullets: vec!["Style: relaxed".to_string()],
        };

        cache.set(&key, &rationale, 60).await.unwrap();
        let stored: Option<Rationale> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(stored, Some(rationale));

        cache.invalidate(&key).await.unwrap();
        let gone: Option<Rationale> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(gone, None);
    }
}
