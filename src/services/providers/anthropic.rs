//! Anthropic messages API provider

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use super::{send_json, TextGenerator};
use crate::error::ProviderError;

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 250;

pub struct AnthropicProvider {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl AnthropicProvider {
    pub fn new(http_client: HttpClient, api_key: String, model: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            model,
            api_url,
        }
    }

    fn extract_text(body: &Value) -> Result<String, ProviderError> {
        if body["stop_reason"].as_str() == Some("max_tokens") {
            return Err(ProviderError::truncated("message hit the token limit"));
        }

        body["content"]
            .as_array()
            .and_then(|blocks| blocks.first())
            .map(|block| block["text"].as_str().unwrap_or_default().to_string())
            .ok_or_else(|| ProviderError::malformed("no content blocks in message response"))
    }
}

#[async_trait]
impl TextGenerator for AnthropicProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/messages", self.api_url);
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{ "role": "user", "content": prompt }]
        });

        let request = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let body = send_json(self.name(), request).await?;
        Self::extract_text(&body)
    }

    fn name(&self) -> &'static str {
        "Claude"
    }
}
