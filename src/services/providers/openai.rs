//! OpenAI-compatible chat completions provider (OpenAI, DeepSeek)

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use super::{send_json, ProviderKind, TextGenerator};
use crate::error::ProviderError;

const SYSTEM_PROMPT: &str = "You are a fashion stylist. Return only valid JSON.";
const MAX_TOKENS: u32 = 250;

pub struct OpenAiProvider {
    kind: ProviderKind,
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAiProvider {
    pub fn new(
        kind: ProviderKind,
        http_client: HttpClient,
        api_key: String,
        model: String,
        api_url: String,
    ) -> Self {
        Self {
            kind,
            http_client,
            api_key,
            model,
            api_url,
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.7,
            "max_tokens": MAX_TOKENS
        })
    }

    fn extract_text(body: &Value) -> Result<String, ProviderError> {
        let choice = body["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or_else(|| ProviderError::malformed("no choices in chat completion response"))?;

        if choice["finish_reason"].as_str() == Some("length") {
            return Err(ProviderError::truncated(
                "chat completion hit the token limit",
            ));
        }

        Ok(choice["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.api_url);

        let request = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt));

        let body = send_json(self.name(), request).await?;
        Self::extract_text(&body)
    }

    fn name(&self) -> &'static str {
        match self.kind {
            ProviderKind::DeepSeek => "DeepSeek",
            _ => "OpenAI",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;

    fn provider(kind: ProviderKind) -> OpenAiProvider {
        OpenAiProvider::new(
            kind,
            HttpClient::new(),
            "key".to_string(),
            "deepseek-chat".to_string(),
            "http://localhost".to_string(),
        )
    }

    #[test]
    fn test_extract_text() {
        let body = json!({
            "choices": [{ "message": { "content": "hello" }, "finish_reason": "stop" }]
        });
        assert_eq!(OpenAiProvider::extract_text(&body).unwrap(), "hello");
    }

    #[test]
    fn test_length_finish_is_truncated() {
        let body = json!({
            "choices": [{ "message": { "content": "{\"paragraph\"" }, "finish_reason": "length" }]
        });
        let err = OpenAiProvider::extract_text(&body).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Truncated);
    }

    #[test]
    fn test_request_body_and_name() {
        let deepseek = provider(ProviderKind::DeepSeek);
        let body = deepseek.request_body("style this");
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["content"], "style this");
        assert_eq!(deepseek.name(), "DeepSeek");
        assert_eq!(provider(ProviderKind::OpenAi).name(), "OpenAI");
    }
}
