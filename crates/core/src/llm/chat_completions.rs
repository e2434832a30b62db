//! # Chat Completions Client
//!
//! Minimal client for OpenAI-compatible `POST {base_url}/chat/completions`
//! endpoints (Groq, OpenAI, local gateways).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{ChatMessage, CompletionError, CompletionService, SamplingParams};
use crate::models::ModelConfig;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(flatten)]
    params: &'a SamplingParams,
}

pub struct ChatCompletionsClient {
    http: reqwest::Client,
    config: ModelConfig,
    endpoint: String,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    /// Build for `config`, reading the provider's API key from the environment.
    ///
    /// A missing key is reported when a completion is requested, not here.
    pub fn from_env(config: &ModelConfig, timeout_secs: u64) -> anyhow::Result<Self> {
        let api_key = std::env::var(config.provider.api_key_env())
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::new(config, api_key, timeout_secs)
    }

    pub fn new(
        config: &ModelConfig,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let base_url = config.effective_base_url().ok_or_else(|| {
            anyhow::anyhow!(
                "{} has no chat completions endpoint",
                config.provider.display_name()
            )
        })?;
        let http = reqwest::Client::builder()
            .user_agent("voyager/0.1")
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Content of `choices[0].message.content`
pub fn parse_completion(body: &Value) -> Result<String, CompletionError> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .ok_or(CompletionError::EmptyResponse)
}

#[async_trait]
impl CompletionService for ChatCompletionsClient {
    fn model_name(&self) -> String {
        self.config.qualified_name()
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey {
                provider: self.config.provider.display_name(),
                env: self.config.provider.api_key_env(),
            })?;

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            params,
        };

        tracing::debug!(model = %self.model_name(), messages = messages.len(), "Requesting completion");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.model_name(), status = status.as_u16(), "Completion failed");
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        parse_completion(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LlmProvider;
    use serde_json::json;

    #[test]
    fn test_request_body_flattens_params() {
        let messages = vec![ChatMessage::user("Plan a trip")];
        let params = SamplingParams::itinerary();
        let body = serde_json::to_value(ChatRequest {
            model: "llama3-8b-8192",
            messages: &messages,
            params: &params,
        })
        .unwrap();

        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 3500);
        assert!(body.get("temperature").is_some());
        assert!(body.get("params").is_none());
    }

    #[test]
    fn test_parse_completion() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Day 1: ..."}}]});
        assert_eq!(parse_completion(&body).unwrap(), "Day 1: ...");

        let empty = json!({"choices": []});
        assert!(matches!(parse_completion(&empty), Err(CompletionError::EmptyResponse)));
    }

    #[test]
    fn test_endpoint() {
        let client = ChatCompletionsClient::new(&ModelConfig::default(), None, 5).unwrap();
        assert_eq!(client.endpoint(), "https://api.groq.com/openai/v1/chat/completions");

        let custom = ModelConfig::with_provider(LlmProvider::OpenAI, "gpt-4o")
            .with_base_url("http://localhost:8080/v1/");
        let client = ChatCompletionsClient::new(&custom, None, 5).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");

        let no_endpoint = ModelConfig::with_provider(LlmProvider::Gemini, "gemini-2.0-flash");
        assert!(ChatCompletionsClient::new(&no_endpoint, None, 5).is_err());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = ChatCompletionsClient::new(&ModelConfig::default(), None, 5).unwrap();
        let err = client
            .complete(&[ChatMessage::user("hi")], &SamplingParams::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompletionError::MissingApiKey { env: "GROQ_API_KEY", .. }
        ));
    }
}
