//! # LLM Module
//!
//! Text completion behind the [`CompletionService`] trait.
//!
//! - [`ChatCompletionsClient`] - OpenAI-compatible `/chat/completions` (Groq by
//!   default), forwards every sampling parameter
//! - [`RadkitCompletion`] - radkit `LlmFunction` for the other providers
//! - [`ScriptedCompletion`] - canned replies for tests and offline runs

pub mod chat_completions;
pub mod prompts;
pub mod radkit_completion;
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::ModelConfig;

pub use chat_completions::ChatCompletionsClient;
pub use radkit_completion::RadkitCompletion;
pub use scripted::ScriptedCompletion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Optional sampling controls. Unset fields use the provider default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

impl SamplingParams {
    /// Creative, long-form settings used for itineraries
    pub fn itinerary() -> Self {
        Self {
            temperature: Some(0.9),
            max_tokens: Some(3500),
            top_p: Some(0.7),
            frequency_penalty: Some(0.5),
            presence_penalty: Some(0.3),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{provider} API key is not configured (set {env})")]
    MissingApiKey {
        provider: &'static str,
        env: &'static str,
    },

    #[error("Completion request failed: {0}")]
    Transport(String),

    #[error("Completion endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion response had no content")]
    EmptyResponse,

    #[error("Provider error: {0}")]
    Provider(String),
}

impl CompletionError {
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::MissingApiKey { .. } => "missing_api_key",
            CompletionError::Transport(_) => "transport",
            CompletionError::Status { .. } => "status",
            CompletionError::EmptyResponse => "empty_response",
            CompletionError::Provider(_) => "provider",
        }
    }
}

/// A hosted language model
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// `provider/model` for logs
    fn model_name(&self) -> String;

    /// Text of the first choice for `messages`
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<String, CompletionError>;
}

/// Pick the client matching the configured provider
pub fn build_completion_service(
    config: &ModelConfig,
    timeout_secs: u64,
) -> anyhow::Result<Arc<dyn CompletionService>> {
    if config.provider.uses_chat_completions() {
        Ok(Arc::new(ChatCompletionsClient::from_env(config, timeout_secs)?))
    } else {
        Ok(Arc::new(RadkitCompletion::new(config.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LlmProvider;

    #[test]
    fn test_itinerary_params() {
        let params = SamplingParams::itinerary();
        assert_eq!(params.temperature, Some(0.9));
        assert_eq!(params.max_tokens, Some(3500));
        assert_eq!(params.top_p, Some(0.7));
        assert_eq!(params.frequency_penalty, Some(0.5));
        assert_eq!(params.presence_penalty, Some(0.3));
    }

    #[test]
    fn test_default_params_serialize_empty() {
        let json = serde_json::to_value(SamplingParams::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_build_picks_client() {
        let groq = build_completion_service(&ModelConfig::default(), 5).unwrap();
        assert_eq!(groq.model_name(), "groq/llama3-8b-8192");

        let anthropic = build_completion_service(
            &ModelConfig::with_provider(LlmProvider::Anthropic, "claude-sonnet-4-20250514"),
            5,
        )
        .unwrap();
        assert_eq!(anthropic.model_name(), "anthropic/claude-sonnet-4-20250514");
    }
}
