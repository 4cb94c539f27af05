use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::cache::CacheBackend;
use crate::error::AppResult;
use crate::services::enrichment::queue::{
    EnqueueOutcome, EnrichmentJob, FailureOutcome, JobQueue, JobRecord, JobState, ReservedJob,
    RetryPolicy, EXHAUSTED_RETENTION_SECS,
};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache backend honouring TTLs
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

struct StoredJob {
    record: JobRecord,
    expires_at: Option<Instant>,
}

#[derive(Default)]
struct QueueState {
    jobs: HashMap<String, StoredJob>,
    ready: VecDeque<String>,
    delayed: Vec<(Instant, String)>,
}

impl QueueState {
    fn purge_expired(&mut self, now: Instant) {
        self.jobs
            .retain(|_, stored| stored.expires_at.map_or(true, |at| at > now));
    }

    fn promote_due(&mut self, now: Instant) {
        let (due, pending): (Vec<_>, Vec<_>) =
            self.delayed.drain(..).partition(|(at, _)| *at <= now);
        self.delayed = pending;
        for (_, id) in due {
            if let Some(stored) = self.jobs.get_mut(&id) {
                stored.record.state = JobState::Queued;
            }
            self.ready.push_back(id);
        }
    }
}

/// In-process job queue with the same identity and retry semantics as the
/// Redis queue
pub struct MemoryJobQueue {
    policy: RetryPolicy,
    state: Mutex<QueueState>,
}

impl MemoryJobQueue {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Number of jobs waiting to be reserved, including scheduled retries
    pub async fn pending(&self) -> usize {
        let state = self.state.lock().await;
        state.ready.len() + state.delayed.len()
    }
}

#[async_trait::async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: EnrichmentJob) -> AppResult<EnqueueOutcome> {
        let mut state = self.state.lock().await;
        state.purge_expired(Instant::now());

        let id = job.id().to_string();
        if state.jobs.contains_key(&id) {
            return Ok(EnqueueOutcome::Duplicate);
        }

        state.jobs.insert(
            id.clone(),
            StoredJob {
                record: JobRecord::queued(job),
                expires_at: None,
            },
        );
        state.ready.push_back(id);
        Ok(EnqueueOutcome::Enqueued)
    }

    async fn reserve(&self) -> AppResult<Option<ReservedJob>> {
        let mut state = self.state.lock().await;
        state.promote_due(Instant::now());

        while let Some(id) = state.ready.pop_front() {
            if let Some(stored) = state.jobs.get_mut(&id) {
                stored.record.start_attempt();
                return Ok(Some(ReservedJob {
                    job: stored.record.job.clone(),
                    attempt: stored.record.attempts,
                }));
            }
        }
        Ok(None)
    }

    async fn complete(&self, job_id: &str) -> AppResult<()> {
        self.state.lock().await.jobs.remove(job_id);
        Ok(())
    }

    async fn fail(&self, job_id: &str, error: &str) -> AppResult<FailureOutcome> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Instant::now();

        let Some(stored) = state.jobs.get_mut(job_id) else {
            return Ok(FailureOutcome::Exhausted { attempts: 0 });
        };

        let outcome = stored.record.record_failure(error, &self.policy);
        match outcome {
            FailureOutcome::RetryScheduled { delay, .. } => {
                state.delayed.push((now + delay, job_id.to_string()));
            }
            FailureOutcome::Exhausted { .. } => {
                stored.expires_at = Some(now + Duration::from_secs(EXHAUSTED_RETENTION_SECS));
            }
        }
        Ok(outcome)
    }

    async fn status(&self, job_id: &str) -> AppResult<Option<JobRecord>> {
        let mut state = self.state.lock().await;
        state.purge_expired(Instant::now());
        Ok(state.jobs.get(job_id).map(|stored| stored.record.clone()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Constraints;
    use crate::services::enrichment::queue::{OutfitFacts, ProductFacts};

    fn facts(sku: &str) -> ProductFacts {
        ProductFacts {
            sku: sku.to_string(),
            title: format!("{} title", sku),
            brand: "Acme".to_string(),
            tags: vec![],
        }
    }

    fn job(id: &str) -> EnrichmentJob {
        EnrichmentJob {
            reco_id: id.to_string(),
            base: facts("T1"),
            items: OutfitFacts {
                top: facts("T1"),
                bottom: facts("B1"),
                footwear: facts("F1"),
                accessories: vec![facts("A1"), facts("O1")],
            },
            constraints: Constraints::default(),
        }
    }

    fn quick_policy(max_attempts: u32, base_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_ms,
            factor: 2.0,
            jitter: 0.0,
            cap_ms: 60_000,
        }
    }

    #[tokio::test]
    async fn test_backend_expires_entries() {
        let backend = MemoryBackend::new();
        backend.set_ex("fresh", "v", 60).await.unwrap();
        backend.set_ex("stale", "v", 0).await.unwrap();

        assert_eq!(backend.get("fresh").await.unwrap(), Some("v".to_string()));
        assert_eq!(backend.get("stale").await.unwrap(), None);

        backend.delete("fresh").await.unwrap();
        assert_eq!(backend.get("fresh").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_enqueue_is_idempotent() {
        let queue = MemoryJobQueue::new(quick_policy(3, 1000));
        assert_eq!(queue.enqueue(job("fp")).await.unwrap(), EnqueueOutcome::Enqueued);
        assert_eq!(queue.enqueue(job("fp")).await.unwrap(), EnqueueOutcome::Duplicate);
        assert_eq!(queue.pending().await, 1);

        let reserved = queue.reserve().await.unwrap().unwrap();
        assert_eq!(reserved.attempt, 1);
        // still known while processing
        assert_eq!(queue.enqueue(job("fp")).await.unwrap(), EnqueueOutcome::Duplicate);
        assert!(queue.reserve().await.unwrap().is_none());

        queue.complete("fp").await.unwrap();
        assert!(queue.status("fp").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retry_becomes_ready_after_delay() {
        let queue = MemoryJobQueue::new(quick_policy(3, 1000));
        queue.enqueue(job("fp")).await.unwrap();
        queue.reserve().await.unwrap().unwrap();

        let outcome = queue.fail("fp", "rate_limit: busy").await.unwrap();
        assert_eq!(
            outcome,
            FailureOutcome::RetryScheduled {
                attempt: 1,
                delay: Duration::from_millis(1000)
            }
        );
        let record = queue.status("fp").await.unwrap().unwrap();
        assert_eq!(record.state, JobState::RetryScheduled);
        assert!(queue.reserve().await.unwrap().is_none());
        assert_eq!(queue.pending().await, 1);
    }

    #[tokio::test]
    async fn test_due_retry_is_reserved_again() {
        let queue = MemoryJobQueue::new(quick_policy(3, 1));
        queue.enqueue(job("fp")).await.unwrap();
        queue.reserve().await.unwrap().unwrap();
        queue.fail("fp", "network: reset").await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        let retried = queue.reserve().await.unwrap().unwrap();
        assert_eq!(retried.attempt, 2);
        assert_eq!(retried.job.reco_id, "fp");
    }

    #[tokio::test]
    async fn test_exhausted_jobs_are_reported() {
        let queue = MemoryJobQueue::new(quick_policy(1, 1000));
        queue.enqueue(job("fp")).await.unwrap();
        queue.reserve().await.unwrap().unwrap();

        let outcome = queue.fail("fp", "auth: bad key").await.unwrap();
        assert_eq!(outcome, FailureOutcome::Exhausted { attempts: 1 });

        let record = queue.status("fp").await.unwrap().unwrap();
        assert_eq!(record.state, JobState::Exhausted);
        assert_eq!(record.last_error.as_deref(), Some("auth: bad key"));
        assert_eq!(queue.enqueue(job("fp")).await.unwrap(), EnqueueOutcome::Duplicate);
        assert!(queue.reserve().await.unwrap().is_none());
    }
}
