use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::error::AppResult;
use crate::services::enrichment::queue::{
    EnqueueOutcome, EnrichmentJob, FailureOutcome, JobQueue, JobRecord, ReservedJob, RetryPolicy,
    EXHAUSTED_RETENTION_SECS,
};

const READY_KEY: &str = "jobs:v2:ready";
const PROCESSING_KEY: &str = "jobs:v2:processing";
const DELAYED_KEY: &str = "jobs:v2:delayed";

/// Creates the record and pushes the id only if the identity is new
const ENQUEUE_SCRIPT: &str = r#"
if redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    redis.call('LPUSH', KEYS[2], ARGV[2])
    return 1
end
return 0
"#;

/// Moves retries whose due time has passed back onto the ready list
const PROMOTE_SCRIPT: &str = r#"
local due = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
for _, id in ipairs(due) do
    redis.call('ZREM', KEYS[1], id)
    redis.call('LPUSH', KEYS[2], id)
end
return #due
"#;

fn job_key(id: &str) -> String {
    format!("jobs:v2:job:{}", id)
}

/// Durable job queue stored in Redis
///
/// Job records live under `jobs:v2:job:{id}`; ids move between a ready list,
/// a processing list and a delayed sorted set scored by due time.
#[derive(Clone)]
pub struct RedisJobQueue {
    conn: ConnectionManager,
    policy: RetryPolicy,
}

impl RedisJobQueue {
    pub async fn connect(client: redis::Client, policy: RetryPolicy) -> AppResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, policy })
    }

    async fn load(&self, id: &str) -> AppResult<Option<JobRecord>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(job_key(id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store(&self, record: &JobRecord, ttl_secs: Option<u64>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let key = job_key(record.job.id());
        let json = serde_json::to_string(record)?;
        match ttl_secs {
            Some(ttl) => {
                let _: () = conn.set_ex(key, json, ttl).await?;
            }
            None => {
                let _: () = conn.set(key, json).await?;
            }
        }
        Ok(())
    }

    async fn promote_due(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let promoted: i64 = Script::new(PROMOTE_SCRIPT)
            .key(DELAYED_KEY)
            .key(READY_KEY)
            .arg(Utc::now().timestamp_millis())
            .invoke_async(&mut conn)
            .await?;
        if promoted > 0 {
            tracing::debug!(promoted, "Promoted due retries");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: EnrichmentJob) -> AppResult<EnqueueOutcome> {
        let mut conn = self.conn.clone();
        let id = job.id().to_string();
        let record = JobRecord::queued(job);

        let created: i64 = Script::new(ENQUEUE_SCRIPT)
            .key(job_key(&id))
            .key(READY_KEY)
            .arg(serde_json::to_string(&record)?)
            .arg(&id)
            .invoke_async(&mut conn)
            .await?;

        Ok(if created == 1 {
            EnqueueOutcome::Enqueued
        } else {
            EnqueueOutcome::Duplicate
        })
    }

    async fn reserve(&self) -> AppResult<Option<ReservedJob>> {
        self.promote_due().await?;

        let mut conn = self.conn.clone();
        loop {
            let id: Option<String> = conn.rpoplpush(READY_KEY, PROCESSING_KEY).await?;
            let Some(id) = id else {
                return Ok(None);
            };

            let Some(mut record) = self.load(&id).await? else {
                // record expired or was completed elsewhere
                let _: () = conn.lrem(PROCESSING_KEY, 0, &id).await?;
                continue;
            };

            record.start_attempt();
            self.store(&record, None).await?;
            return Ok(Some(ReservedJob {
                attempt: record.attempts,
                job: record.job,
            }));
        }
    }

    async fn complete(&self, job_id: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(job_key(job_id)).await?;
        let _: () = conn.lrem(PROCESSING_KEY, 0, job_id).await?;
        Ok(())
    }

    async fn fail(&self, job_id: &str, error: &str) -> AppResult<FailureOutcome> {
        let mut conn = self.conn.clone();
        let _: () = conn.lrem(PROCESSING_KEY, 0, job_id).await?;

        let Some(mut record) = self.load(job_id).await? else {
            return Ok(FailureOutcome::Exhausted { attempts: 0 });
        };

        let outcome = record.record_failure(error, &self.policy);
        match outcome {
            FailureOutcome::RetryScheduled { delay, .. } => {
                self.store(&record, None).await?;
                let due = Utc::now().timestamp_millis() + delay.as_millis() as i64;
                let _: () = conn.zadd(DELAYED_KEY, job_id, due).await?;
            }
            FailureOutcome::Exhausted { .. } => {
                self.store(&record, Some(EXHAUSTED_RETENTION_SECS)).await?;
            }
        }
        Ok(outcome)
    }

    async fn status(&self, job_id: &str) -> AppResult<Option<JobRecord>> {
        self.load(job_id).await
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
