//! Startup wiring shared by the API server and the standalone worker

use std::sync::Arc;

use anyhow::Context;

use crate::{
    catalog::{load_catalog, Catalog},
    config::{CacheBackendKind, Config},
    db::{
        create_redis_client, Cache, CacheBackend, MemoryBackend, MemoryJobQueue, RedisBackend,
        RedisJobQueue,
    },
    routes::AppState,
    services::{
        enrichment::{EnrichmentWorker, JobQueue},
        providers::build_generator,
        RecommendationService,
    },
};

/// Storage shared by request handling and enrichment
pub struct Backends {
    pub cache: Cache,
    pub queue: Arc<dyn JobQueue>,
}

/// Connects the configured cache backend and job queue
pub async fn connect_backends(config: &Config) -> anyhow::Result<Backends> {
    let (backend, queue): (Arc<dyn CacheBackend>, Arc<dyn JobQueue>) = match config.cache_backend
    {
        CacheBackendKind::Redis => {
            let client = create_redis_client(&config.redis_url)?;
            let backend: Arc<dyn CacheBackend> = Arc::new(
                RedisBackend::connect(client.clone())
                    .await
                    .context("Failed to connect Redis cache")?,
            );
            let queue: Arc<dyn JobQueue> = Arc::new(
                RedisJobQueue::connect(client, config.retry_policy())
                    .await
                    .context("Failed to connect Redis job queue")?,
            );
            (backend, queue)
        }
        CacheBackendKind::Memory => {
            tracing::warn!("Using in-memory cache and queue; state is lost on restart");
            let backend: Arc<dyn CacheBackend> = Arc::new(MemoryBackend::new());
            let queue: Arc<dyn JobQueue> = Arc::new(MemoryJobQueue::new(config.retry_policy()));
            (backend, queue)
        }
    };

    tracing::info!(cache = backend.name(), queue = queue.name(), "Backends ready");

    Ok(Backends {
        cache: Cache::new(backend),
        queue,
    })
}

pub fn open_catalog(path: &str) -> anyhow::Result<Catalog> {
    load_catalog(path).with_context(|| format!("Failed to load catalog from {}", path))
}

pub fn app_state(catalog: Catalog, backends: &Backends) -> AppState {
    let service = RecommendationService::new(
        Arc::new(catalog),
        backends.cache.clone(),
        backends.queue.clone(),
    );
    AppState::new(service)
}

/// Builds a worker around the configured text-generation provider
pub fn enrichment_worker(config: &Config, backends: &Backends) -> anyhow::Result<EnrichmentWorker> {
    let provider = config.provider_config()?;
    let generator = build_generator(&provider)?;
    Ok(EnrichmentWorker::new(
        backends.queue.clone(),
        backends.cache.clone(),
        generator,
    ))
}
