//! Text-generation provider abstraction
//!
//! Each provider turns a prompt into raw completion text over HTTP. Parsing
//! the completion into a rationale is shared, so providers only differ in
//! request shape, authentication and response envelope.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use crate::{
    error::{AppError, AppResult, ProviderError, ProviderErrorKind},
    models::Rationale,
    services::enrichment::validation::parse_response,
};

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Error bodies are cut to this many characters in error messages
const ERROR_BODY_LIMIT: usize = 300;

/// Capability that produces rationale text for a prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Raw completion text for a prompt
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Completion parsed into a rationale
    async fn generate(&self, prompt: &str) -> Result<Rationale, ProviderError> {
        let text = self.complete(prompt).await?;
        parse_response(&text)
    }

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Claude,
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Gemini,
        ProviderKind::OpenAi,
        ProviderKind::Claude,
        ProviderKind::DeepSeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Claude => "claude",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::Claude => "claude-3-haiku-20240307",
            ProviderKind::DeepSeek => "deepseek-chat",
        }
    }

    pub fn default_api_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Claude => "https://api.anthropic.com/v1",
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| {
                let available: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.as_str()).collect();
                format!(
                    "Unknown AI provider: {}. Available providers: {}",
                    name,
                    available.join(", ")
                )
            })
    }
}

/// Everything needed to construct a provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.kind.default_model().to_string())
    }

    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| self.kind.default_api_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

/// Builds the configured provider
pub fn build_generator(config: &ProviderConfig) -> AppResult<Arc<dyn TextGenerator>> {
    let api_key = config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            AppError::Config(format!("AI_API_KEY is required for provider {}", config.kind))
        })?;

    let http_client = reqwest::Client::builder().timeout(config.timeout).build()?;

    let generator: Arc<dyn TextGenerator> = match config.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            http_client,
            api_key,
            config.model(),
            config.api_url(),
        )),
        ProviderKind::OpenAi | ProviderKind::DeepSeek => Arc::new(OpenAiProvider::new(
            config.kind,
            http_client,
            api_key,
            config.model(),
            config.api_url(),
        )),
        ProviderKind::Claude => Arc::new(AnthropicProvider::new(
            http_client,
            api_key,
            config.model(),
            config.api_url(),
        )),
    };

    tracing::info!(
        provider = generator.name(),
        model = %config.model(),
        "Text generator configured"
    );

    Ok(generator)
}

/// Maps a non-success HTTP status to a provider error
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let kind = match status.as_u16() {
        401 | 403 => ProviderErrorKind::Auth,
        402 | 429 => ProviderErrorKind::RateLimit,
        _ => ProviderErrorKind::Network,
    };
    let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    ProviderError::new(
        kind,
        format!("{} API returned status {}: {}", provider, status, body),
    )
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        // request URLs can carry credentials
        let e = e.without_url();
        if e.is_decode() {
            ProviderError::malformed(format!("undecodable response body: {}", e))
        } else {
            ProviderError::new(ProviderErrorKind::Network, e.to_string())
        }
    }
}

/// Sends a JSON request and returns the decoded JSON body, mapping failures
/// to provider errors
pub(crate) async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, ProviderError> {
    let response = request.send().await?;
    read_json(provider, response).await
}

/// Decodes a response body, turning a non-success status into a provider error
pub(crate) async fn read_json(
    provider: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value, ProviderError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(provider, status, &body));
    }

    Ok(response.json().await?)
}
