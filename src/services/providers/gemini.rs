//! Google Gemini provider
//!
//! Calls `models/{model}:generateContent` with the API key in the
//! `x-goog-api-key` header, so it never appears in a URL. A 404 from a
//! `v1beta` base is retried once against `v1`, since some models are only
//! served there. A `finishReason` of `MAX_TOKENS` means the JSON was cut off.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::{json, Value};

use super::{read_json, TextGenerator};
use crate::error::ProviderError;

const MAX_OUTPUT_TOKENS: u32 = 1024;
const API_KEY_HEADER: &str = "x-goog-api-key";

/// The `v1` base to fall back to when `api_url` ends in `/v1beta`
fn v1_fallback_url(api_url: &str) -> Option<String> {
    api_url
        .strip_suffix("/v1beta")
        .map(|root| format!("{}/v1", root))
}

pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl GeminiProvider {
    pub fn new(http_client: HttpClient, api_key: String, model: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            model,
            api_url,
        }
    }

    fn request(&self, api_url: &str, prompt: &str) -> reqwest::RequestBuilder {
        self.http_client
            .post(format!("{}/models/{}:generateContent", api_url, self.model))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&Self::request_body(prompt))
    }

    fn request_body(prompt: &str) -> Value {
        let safety: Vec<Value> = [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .iter()
        .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
        .collect();

        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
                "topP": 0.95,
                "topK": 40
            },
            "safetySettings": safety
        })
    }

    /// Pulls the completion text out of a generateContent response
    fn extract_text(body: &Value) -> Result<String, ProviderError> {
        let candidate = body["candidates"]
            .as_array()
            .and_then(|candidates| candidates.first())
            .ok_or_else(|| ProviderError::malformed("no candidates in Gemini response"))?;

        match candidate["finishReason"].as_str() {
            Some("MAX_TOKENS") => {
                return Err(ProviderError::truncated(
                    "Gemini response hit the output token limit",
                ))
            }
            Some("SAFETY") => {
                return Err(ProviderError::malformed(
                    "Gemini response was blocked by safety filters",
                ))
            }
            _ => {}
        }

        Ok(candidate["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut response = self.request(&self.api_url, prompt).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            if let Some(fallback) = v1_fallback_url(&self.api_url) {
                tracing::warn!(model = %self.model, "Gemini v1beta returned 404, retrying on v1");
                response = self.request(&fallback, prompt).send().await?;
            }
        }

        let body = read_json(self.name(), response).await?;
        Self::extract_text(&body)
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}
