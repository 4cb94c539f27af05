use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{Constraints, Outfit, Product};

/// Scalar facts about one product, copied into a job so it can be
/// processed without access to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFacts {
    pub sku: String,
    pub title: String,
    pub brand: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&Product> for ProductFacts {
    fn from(product: &Product) -> Self {
        Self {
            sku: product.sku.clone(),
            title: product.title.clone(),
            brand: product.brand.clone(),
            tags: product.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitFacts {
    pub top: ProductFacts,
    pub bottom: ProductFacts,
    pub footwear: ProductFacts,
    pub accessories: Vec<ProductFacts>,
}

/// Request to generate a rationale for one outfit
///
/// The outfit fingerprint doubles as the job identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentJob {
    pub reco_id: String,
    pub base: ProductFacts,
    pub items: OutfitFacts,
    pub constraints: Constraints,
}

impl EnrichmentJob {
    pub fn for_outfit(base: &Product, outfit: &Outfit, constraints: &Constraints) -> Self {
        Self {
            reco_id: outfit.reco_id.clone(),
            base: base.into(),
            items: OutfitFacts {
                top: (&outfit.top).into(),
                bottom: (&outfit.bottom).into(),
                footwear: (&outfit.footwear).into(),
                accessories: outfit.accessories.iter().map(ProductFacts::from).collect(),
            },
            constraints: constraints.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.reco_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    RetryScheduled,
    Exhausted,
}

/// Queue-side bookkeeping for a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job: EnrichmentJob,
    pub state: JobState,
    /// Attempts started so far
    pub attempts: u32,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn queued(job: EnrichmentJob) -> Self {
        let now = Utc::now();
        Self {
            job,
            state: JobState::Queued,
            attempts: 0,
            last_error: None,
            enqueued_at: now,
            updated_at: now,
        }
    }

    /// Marks the record as handed to a worker
    pub fn start_attempt(&mut self) {
        self.state = JobState::Processing;
        self.attempts += 1;
        self.updated_at = Utc::now();
    }

    /// Records a failed attempt and decides what happens next
    pub fn record_failure(&mut self, error: &str, policy: &RetryPolicy) -> FailureOutcome {
        self.last_error = Some(error.to_string());
        self.updated_at = Utc::now();

        if policy.allows_retry(self.attempts) {
            self.state = JobState::RetryScheduled;
            FailureOutcome::RetryScheduled {
                attempt: self.attempts,
                delay: policy.next_delay(self.attempts),
            }
        } else {
            self.state = JobState::Exhausted;
            FailureOutcome::Exhausted {
                attempts: self.attempts,
            }
        }
    }
}

/// A job handed to a worker
#[derive(Debug, Clone, PartialEq)]
pub struct ReservedJob {
    pub job: EnrichmentJob,
    /// 1-based attempt number
    pub attempt: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued,
    /// A job with the same identity is already known to the queue
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    RetryScheduled { attempt: u32, delay: Duration },
    Exhausted { attempts: u32 },
}

/// Exhausted records are kept this long for reporting
pub const EXHAUSTED_RETENTION_SECS: u64 = 24 * 60 * 60;

/// Exponential backoff with symmetric jitter
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_ms: u64,
    pub factor: f64,
    pub jitter: f64,
    pub cap_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_ms: 1000,
            factor: 2.0,
            jitter: 0.2,
            cap_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Delay before retrying after `attempt` failed attempts, without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = (self.base_ms as f64 * self.factor.powi(exponent)).min(self.cap_ms as f64);
        Duration::from_millis(delay.round() as u64)
    }

    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(attempt).as_millis() as f64;
        let jitter = if self.jitter > 0.0 {
            1.0 + (rng.gen::<f64>() * 2.0 - 1.0) * self.jitter.abs()
        } else {
            1.0
        };
        Duration::from_millis((base * jitter).round() as u64)
    }

    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::thread_rng())
    }
}

/// Durable work queue with identity dedup and retry scheduling
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait JobQueue: Send + Sync {
    /// Adds a job unless one with the same identity is already known
    async fn enqueue(&self, job: EnrichmentJob) -> AppResult<EnqueueOutcome>;

    /// Takes the next ready job, promoting retries that have come due
    async fn reserve(&self) -> AppResult<Option<ReservedJob>>;

    /// Removes a successfully processed job
    async fn complete(&self, job_id: &str) -> AppResult<()>;

    /// Records a failed attempt; schedules a retry or marks the job exhausted
    async fn fail(&self, job_id: &str, error: &str) -> AppResult<FailureOutcome>;

    async fn status(&self, job_id: &str) -> AppResult<Option<JobRecord>>;

    /// Queue name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::fixtures::product;
    use crate::models::Role;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_ms: 1000,
            factor: 2.0,
            jitter: 0.0,
            cap_ms: 5000,
        };
        assert_eq!(policy.base_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.base_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.base_delay(3), Duration::from_millis(4000));
        assert_eq!(policy.base_delay(4), Duration::from_millis(5000));
        assert_eq!(policy.next_delay(9), Duration::from_millis(5000));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let delay = policy.delay_with(2, &mut rng).as_millis();
            assert!((1600..=2400).contains(&delay), "delay {} out of range", delay);
        }
    }

    #[test]
    fn test_record_failure_until_exhausted() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let base = product("T1", Role::Top, 10.0, &[]);
        let job = EnrichmentJob {
            reco_id: "fp".to_string(),
            base: (&base).into(),
            items: OutfitFacts {
                top: (&base).into(),
                bottom: (&base).into(),
                footwear: (&base).into(),
                accessories: vec![],
            },
            constraints: Constraints::default(),
        };
        let mut record = JobRecord::queued(job);

        record.start_attempt();
        assert!(matches!(
            record.record_failure("rate_limit: slow down", &policy),
            FailureOutcome::RetryScheduled { attempt: 1, .. }
        ));
        assert_eq!(record.state, JobState::RetryScheduled);

        record.start_attempt();
        assert_eq!(
            record.record_failure("truncated: cut off", &policy),
            FailureOutcome::Exhausted { attempts: 2 }
        );
        assert_eq!(record.state, JobState::Exhausted);
        assert_eq!(record.last_error.as_deref(), Some("truncated: cut off"));
    }

    #[test]
    fn test_job_copies_outfit_facts() {
        let base = product("T1", Role::Top, 10.0, &["casual"]);
        let outfit = Outfit {
            reco_id: "fp".to_string(),
            top: base.clone(),
            bottom: product("B1", Role::Bottom, 10.0, &[]),
            footwear: product("F1", Role::Footwear, 10.0, &[]),
            accessories: vec![product("A1", Role::Accessory, 10.0, &[])],
            match_score: 0.5,
            total_price: 40.0,
            reasoning_fast: vec![],
        };

        let job = EnrichmentJob::for_outfit(&base, &outfit, &Constraints::default());
        assert_eq!(job.id(), "fp");
        assert_eq!(job.base.tags, vec!["casual".to_string()]);
        assert_eq!(job.items.bottom.sku, "B1");
        assert_eq!(job.items.accessories[0].title, "A1 title");
    }
}
