pub mod prompt;
pub mod queue;
pub mod validation;
pub mod worker;

pub use queue::{
    EnqueueOutcome, EnrichmentJob, FailureOutcome, JobQueue, JobRecord, JobState, ReservedJob,
    RetryPolicy,
};
pub use worker::{EnrichmentWorker, JobOutcome, WorkerPool};
