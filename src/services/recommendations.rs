use std::sync::Arc;
use std::time::Instant;

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    cached,
    catalog::Catalog,
    db::{Cache, CacheKey, InFlight, RESULTS_TTL_SECS},
    error::{AppError, AppResult},
    models::{
        Constraints, EnrichedOutfit, Outfit, Product, Rationale, RecommendationRequest,
        RecommendationResponse,
    },
    services::{
        enrichment::{EnrichmentJob, JobQueue},
        outfit_search::OutfitSearch,
    },
};

/// Per-request orchestration: cached or freshly generated outfits, each
/// paired with its rationale or queued for enrichment
///
/// Rationale is best-effort; cache and queue problems on that path only
/// leave an outfit pending.
#[derive(Clone)]
pub struct RecommendationService {
    catalog: Arc<Catalog>,
    cache: Cache,
    queue: Arc<dyn JobQueue>,
    in_flight: Arc<InFlight<(Vec<Outfit>, bool)>>,
    seed: Option<u64>,
}

impl RecommendationService {
    pub fn new(catalog: Arc<Catalog>, cache: Cache, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            catalog,
            cache,
            queue,
            in_flight: Arc::new(InFlight::new()),
            seed: None,
        }
    }

    /// Fixes the sampling seed so generation is reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn recommend(&self, request: RecommendationRequest) -> AppResult<RecommendationResponse> {
        let started = Instant::now();

        let base = self
            .catalog
            .get(&request.base_sku)
            .ok_or_else(|| AppError::NotFound("Base product not found".to_string()))?;

        let key = CacheKey::recommendations(&request);
        let key_str = key.to_string();
        let (outfits, cached) = self
            .in_flight
            .run(&key_str, || self.load_or_generate(base, &request, key))
            .await?;

        let mut enriched = Vec::with_capacity(outfits.len());
        for outfit in outfits {
            enriched.push(self.attach_rationale(base, outfit, &request.constraints).await);
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            base_sku = %request.base_sku,
            cache_key = %key_str,
            cached,
            outfits = enriched.len(),
            latency_ms,
            "Recommendations served"
        );

        Ok(RecommendationResponse {
            base_sku: request.base_sku,
            cached,
            latency_ms,
            outfits: enriched,
        })
    }

    async fn load_or_generate(
        &self,
        base: &Product,
        request: &RecommendationRequest,
        key: CacheKey,
    ) -> AppResult<(Vec<Outfit>, bool)> {
        cached!(self.cache, key, RESULTS_TTL_SECS, async {
            Ok::<_, AppError>(self.search(base, request))
        })
    }

    fn search(&self, base: &Product, request: &RecommendationRequest) -> Vec<Outfit> {
        let search = OutfitSearch::new(&self.catalog);
        match self.seed {
            Some(seed) => search.generate(
                base,
                request.count,
                &request.constraints,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => search.generate(
                base,
                request.count,
                &request.constraints,
                &mut rand::thread_rng(),
            ),
        }
    }

    async fn attach_rationale(
        &self,
        base: &Product,
        outfit: Outfit,
        constraints: &Constraints,
    ) -> EnrichedOutfit {
        let key = CacheKey::Rationale(outfit.reco_id.clone());

        match self.cache.get_from_cache::<Rationale>(&key).await {
            Ok(Some(rationale)) if rationale.is_servable() => {
                return EnrichedOutfit::ready(outfit, rationale);
            }
            Ok(Some(_)) => {
                tracing::warn!(reco_id = %outfit.reco_id, "Discarding empty rationale");
                if let Err(e) = self.cache.invalidate(&key).await {
                    tracing::warn!(reco_id = %outfit.reco_id, error = %e, "Failed to purge rationale");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(reco_id = %outfit.reco_id, error = %e, "Rationale lookup failed");
            }
        }

        let job = EnrichmentJob::for_outfit(base, &outfit, constraints);
        match self.queue.enqueue(job).await {
            Ok(outcome) => {
                tracing::debug!(reco_id = %outfit.reco_id, ?outcome, "Rationale requested");
            }
            Err(e) => {
                tracing::warn!(reco_id = %outfit.reco_id, error = %e, "Failed to enqueue rationale job");
            }
        }

        EnrichedOutfit::pending(outfit)
    }
}
