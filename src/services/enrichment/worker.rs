use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::prompt::build_prompt;
use super::queue::{EnrichmentJob, FailureOutcome, JobQueue};
use super::validation::validate_rationale;
use crate::db::{Cache, CacheKey, RATIONALE_TTL_SECS};
use crate::error::AppResult;
use crate::models::Rationale;
use crate::services::providers::TextGenerator;

/// What a single `process_next` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Nothing was ready
    Idle,
    Stored,
    /// A servable rationale already existed; nothing was generated
    AlreadyCached,
    RetryScheduled { delay: Duration },
    Exhausted,
}

/// Drains enrichment jobs: prompt, generate, validate, persist
pub struct EnrichmentWorker {
    queue: Arc<dyn JobQueue>,
    cache: Cache,
    generator: Arc<dyn TextGenerator>,
}

impl EnrichmentWorker {
    pub fn new(queue: Arc<dyn JobQueue>, cache: Cache, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            queue,
            cache,
            generator,
        }
    }

    /// Reserves and processes at most one job
    ///
    /// Generation and validation failures are handed back to the queue and
    /// reported through the outcome; only queue or cache I/O errors are
    /// returned as `Err`.
    pub async fn process_next(&self) -> AppResult<JobOutcome> {
        let Some(reserved) = self.queue.reserve().await? else {
            return Ok(JobOutcome::Idle);
        };

        let job_id = reserved.job.id().to_string();
        let started = Instant::now();
        tracing::info!(
            job_id = %job_id,
            attempt = reserved.attempt,
            provider = self.generator.name(),
            "Processing enrichment job"
        );

        match self.enrich(&reserved.job).await {
            Ok(stored) => {
                self.queue.complete(&job_id).await?;
                tracing::info!(
                    job_id = %job_id,
                    stored,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Enrichment job completed"
                );
                Ok(if stored {
                    JobOutcome::Stored
                } else {
                    JobOutcome::AlreadyCached
                })
            }
            Err(e) => match self.queue.fail(&job_id, &e.to_string()).await? {
                FailureOutcome::RetryScheduled { attempt, delay } => {
                    tracing::warn!(
                        job_id = %job_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        retryable = e.is_retryable(),
                        error = %e,
                        "Enrichment attempt failed, retry scheduled"
                    );
                    Ok(JobOutcome::RetryScheduled { delay })
                }
                FailureOutcome::Exhausted { attempts } => {
                    tracing::error!(
                        job_id = %job_id,
                        attempts,
                        error = %e,
                        "Enrichment job exhausted its retries"
                    );
                    Ok(JobOutcome::Exhausted)
                }
            },
        }
    }

    /// Returns whether a new rationale was written
    async fn enrich(&self, job: &EnrichmentJob) -> AppResult<bool> {
        let key = CacheKey::Rationale(job.reco_id.clone());

        let existing: Option<Rationale> = self.cache.get_from_cache(&key).await?;
        if existing.is_some_and(|r| r.is_servable()) {
            return Ok(false);
        }

        let prompt = build_prompt(job);
        let generated = self.generator.generate(&prompt).await?;
        let rationale = validate_rationale(generated)?;

        self.cache.set(&key, &rationale, RATIONALE_TTL_SECS).await?;
        Ok(true)
    }
}

/// A fixed number of worker loops sharing one [`EnrichmentWorker`]
pub struct WorkerPool {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(worker: Arc<EnrichmentWorker>, concurrency: usize, poll_interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let concurrency = concurrency.max(1);

        let handles = (0..concurrency)
            .map(|worker_id| {
                let worker = worker.clone();
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    Self::run_loop(worker, worker_id, shutdown_rx, poll_interval).await;
                })
            })
            .collect();

        tracing::info!(concurrency, "Enrichment worker pool started");
        Self {
            shutdown_tx,
            handles,
        }
    }

    async fn run_loop(
        worker: Arc<EnrichmentWorker>,
        worker_id: usize,
        mut shutdown_rx: watch::Receiver<bool>,
        poll_interval: Duration,
    ) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let idle = match worker.process_next().await {
                Ok(JobOutcome::Idle) => true,
                Ok(_) => false,
                Err(e) => {
                    tracing::error!(worker_id, error = %e, "Enrichment worker error");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!(worker_id, "Enrichment worker stopped");
    }

    /// Stops every loop after its current job and waits for them to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Enrichment worker task failed");
            }
        }
        tracing::info!("Enrichment worker pool stopped");
    }
}
