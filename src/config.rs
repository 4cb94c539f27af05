use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::services::enrichment::RetryPolicy;
use crate::services::providers::{ProviderConfig, ProviderKind};

/// Where cached results, rationale and queued jobs are kept
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_cache_backend")]
    pub cache_backend: CacheBackendKind,

    /// Product catalog CSV
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// One of gemini, openai, claude, deepseek
    #[serde(default = "default_ai_provider")]
    pub ai_provider: String,

    pub ai_api_key: Option<String>,
    pub ai_model: Option<String>,
    pub ai_api_url: Option<String>,

    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,

    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default = "default_job_max_attempts")]
    pub job_max_attempts: u32,

    #[serde(default = "default_job_backoff_base_ms")]
    pub job_backoff_base_ms: u64,

    #[serde(default = "default_job_backoff_cap_ms")]
    pub job_backoff_cap_ms: u64,

    /// Run enrichment workers inside the API process
    #[serde(default = "default_embedded_workers")]
    pub embedded_workers: bool,

    /// Fallback filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_cache_backend() -> CacheBackendKind {
    CacheBackendKind::Redis
}

fn default_catalog_path() -> String {
    "./data/products.csv".to_string()
}

fn default_ai_provider() -> String {
    "gemini".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    20
}

fn default_worker_concurrency() -> usize {
    2
}

fn default_job_max_attempts() -> u32 {
    5
}

fn default_job_backoff_base_ms() -> u64 {
    1000
}

fn default_job_backoff_cap_ms() -> u64 {
    60_000
}

fn default_embedded_workers() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Fails on an unknown provider name, listing the supported ones
    pub fn provider_config(&self) -> AppResult<ProviderConfig> {
        let kind = self
            .ai_provider
            .parse::<ProviderKind>()
            .map_err(AppError::Config)?;

        Ok(ProviderConfig {
            kind,
            api_key: self.ai_api_key.clone(),
            model: self.ai_model.clone(),
            api_url: self.ai_api_url.clone(),
            timeout: Duration::from_secs(self.ai_timeout_secs),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.job_max_attempts.max(1),
            base_ms: self.job_backoff_base_ms,
            cap_ms: self.job_backoff_cap_ms,
            ..RetryPolicy::default()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
