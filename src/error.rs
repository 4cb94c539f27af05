use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Display;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] csv::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a failed enrichment attempt with this error should go back to the queue.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Provider(e) => e.is_retryable(),
            AppError::Validation(_) | AppError::HttpClient(_) | AppError::Cache(_) => true,
            AppError::Serialization(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Cache(_)
            | AppError::Serialization(_)
            | AppError::Catalog(_)
            | AppError::Config(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Provider(_) | AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure category reported by a text-generation provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Auth,
    RateLimit,
    Truncated,
    Malformed,
    Network,
}

impl Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderErrorKind::Auth => "auth",
            ProviderErrorKind::RateLimit => "rate_limit",
            ProviderErrorKind::Truncated => "truncated",
            ProviderErrorKind::Malformed => "malformed",
            ProviderErrorKind::Network => "network",
        };
        write!(f, "{}", name)
    }
}

/// Error raised by a text-generation call
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn truncated(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Truncated, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }

    /// Every provider failure only fails the current attempt; the job itself is retried.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ProviderErrorKind::Auth
            | ProviderErrorKind::RateLimit
            | ProviderErrorKind::Truncated
            | ProviderErrorKind::Malformed
            | ProviderErrorKind::Network => true,
        }
    }
}
