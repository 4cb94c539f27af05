pub mod cache;
pub mod inflight;
pub mod memory;
pub mod redis;

mod macros;

pub use cache::{
    budget_bucket, Cache, CacheBackend, CacheKey, RATIONALE_TTL_SECS, RESULTS_TTL_SECS,
};
pub use inflight::InFlight;
pub use memory::{MemoryBackend, MemoryJobQueue};
pub use self::redis::{create_redis_client, RedisBackend, RedisJobQueue};
