use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::db::cache::CacheBackend;
use crate::error::AppResult;

pub mod queue;

pub use queue::RedisJobQueue;

/// Creates a Redis client for caching and job storage
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Cache backend over a managed, auto-reconnecting Redis connection
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    pub async fn connect(client: Client) -> AppResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Cache, CacheKey};
    use crate::models::Rationale;
    use std::sync::Arc;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_redis_cache_round_trip() {
        let client = create_redis_client(&redis_url()).unwrap();
        let backend = Arc::new(RedisBackend::connect(client).await.unwrap());
        let cache = Cache::new(backend.clone());

        let key = CacheKey::Rationale("test_redis_round_trip".to_string());
        let rationale = Rationale {
            paragraph: "Clean lines with a relaxed denim base.".to_string(),
            bullets: vec!["Style: minimal".to_string()],
        };

        cache.set(&key, &rationale, 60).await.unwrap();

        let stored: Option<Rationale> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(stored, Some(rationale));

        cache.invalidate(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_redis_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let backend = RedisBackend::connect(client).await.unwrap();
        assert_eq!(backend.get("nonexistent_key_12345").await.unwrap(), None);
    }
}
