use std::sync::Arc;
use std::time::Duration;

use outfit_api::{bootstrap, config::Config, routes::create_router, services::enrichment::WorkerPool, telemetry};

const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(&config.log_level)?;

    let catalog = bootstrap::open_catalog(&config.catalog_path)?;
    let backends = bootstrap::connect_backends(&config).await?;

    let workers = if config.embedded_workers {
        let worker = bootstrap::enrichment_worker(&config, &backends)?;
        Some(WorkerPool::spawn(
            Arc::new(worker),
            config.worker_concurrency,
            WORKER_POLL_INTERVAL,
        ))
    } else {
        tracing::info!("Embedded workers disabled; run enrichment-worker separately");
        None
    };

    let app = create_router(bootstrap::app_state(catalog, &backends));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = workers {
        pool.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
