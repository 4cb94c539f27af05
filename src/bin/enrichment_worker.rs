//! Standalone enrichment worker draining the shared job queue

use std::sync::Arc;
use std::time::Duration;

use outfit_api::{
    bootstrap,
    config::{CacheBackendKind, Config},
    services::enrichment::WorkerPool,
    telemetry,
};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(&config.log_level)?;

    if config.cache_backend == CacheBackendKind::Memory {
        anyhow::bail!("enrichment-worker needs CACHE_BACKEND=redis to share jobs with the API");
    }

    let backends = bootstrap::connect_backends(&config).await?;
    let worker = bootstrap::enrichment_worker(&config, &backends)?;
    let pool = WorkerPool::spawn(Arc::new(worker), config.worker_concurrency, POLL_INTERVAL);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    pool.shutdown().await;
    Ok(())
}
