//! # Radkit Completion
//!
//! Completion through radkit's structured `LlmFunction`. The reply comes back
//! as an [`AssistantReply`]; provider defaults apply to sampling.

use async_trait::async_trait;
use radkit::agent::LlmFunction;
use radkit::macros::LLMOutput;
use radkit::models::providers::{
    AnthropicLlm, DeepSeekLlm, GeminiLlm, GrokLlm, OpenAILlm, OpenRouterLlm,
};
use radkit::models::BaseLlm;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::prompts;
use super::{ChatMessage, CompletionError, CompletionService, SamplingParams};
use crate::models::{LlmProvider, ModelConfig};

/// Structured reply requested from the model
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct AssistantReply {
    /// The complete reply shown to the traveller, in Markdown
    pub content: String,
}

pub struct RadkitCompletion {
    config: ModelConfig,
}

impl RadkitCompletion {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    async fn run(&self, system: String, prompt: String) -> anyhow::Result<AssistantReply> {
        let model = self.config.model.as_str();
        match self.config.provider {
            LlmProvider::Groq => Err(anyhow::anyhow!(
                "groq is served by the chat completions client"
            )),
            LlmProvider::Anthropic => ask(AnthropicLlm::from_env(model)?, system, prompt).await,
            LlmProvider::OpenAI => {
                let mut llm = OpenAILlm::from_env(model)?;
                if let Some(base_url) = &self.config.base_url {
                    llm = llm.with_base_url(base_url);
                }
                ask(llm, system, prompt).await
            }
            LlmProvider::Gemini => ask(GeminiLlm::from_env(model)?, system, prompt).await,
            LlmProvider::OpenRouter => ask(OpenRouterLlm::from_env(model)?, system, prompt).await,
            LlmProvider::Grok => ask(GrokLlm::from_env(model)?, system, prompt).await,
            LlmProvider::DeepSeek => ask(DeepSeekLlm::from_env(model)?, system, prompt).await,
        }
    }
}

async fn ask<L: BaseLlm + 'static>(
    llm: L,
    system: String,
    prompt: String,
) -> anyhow::Result<AssistantReply> {
    let func = LlmFunction::<AssistantReply>::new_with_system_instructions(llm, system);
    Ok(func.run(prompt).await?)
}

/// Split messages into system instructions and the prompt body
pub fn flatten_messages(messages: &[ChatMessage]) -> (String, String) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect();
    let prompt: Vec<&str> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| m.content.as_str())
        .collect();

    let system = if system.is_empty() {
        prompts::TRAVEL_ASSISTANT.to_string()
    } else {
        system.join("\n\n")
    };
    (system, prompt.join("\n\n"))
}

#[async_trait]
impl CompletionService for RadkitCompletion {
    fn model_name(&self) -> String {
        self.config.qualified_name()
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<String, CompletionError> {
        if *params != SamplingParams::default() {
            tracing::debug!(model = %self.model_name(), "Sampling parameters are not forwarded on the radkit path");
        }

        let (system, prompt) = flatten_messages(messages);
        let reply = self
            .run(system, prompt)
            .await
            .map_err(|e| CompletionError::Provider(e.to_string()))?;

        if reply.content.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(reply.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_groq_is_rejected() {
        let completion = RadkitCompletion::new(ModelConfig::new("llama3-8b-8192"));
        let err = completion
            .complete(&[ChatMessage::user("hi")], &SamplingParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Provider(msg) if msg.contains("chat completions")));
    }

    #[test]
    fn test_flatten_messages() {
        let (system, prompt) = flatten_messages(&[
            ChatMessage::system("Be brief."),
            ChatMessage::user("User: hi"),
        ]);
        assert_eq!(system, "Be brief.");
        assert_eq!(prompt, "User: hi");

        let (system, _) = flatten_messages(&[ChatMessage::user("hello")]);
        assert_eq!(system, prompts::TRAVEL_ASSISTANT);
    }
}
