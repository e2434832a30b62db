//! # Voyager Models
//!
//! LLM provider selection and model configuration.
//!
//! Groq and OpenAI speak the OpenAI chat-completions protocol and are served
//! by [`crate::llm::ChatCompletionsClient`], which forwards sampling
//! parameters. The remaining providers go through radkit's `LlmFunction`.

use serde::{Deserialize, Serialize};

/// Supported LLM providers
///
/// - Groq - `GROQ_API_KEY`
/// - OpenAI (GPT) - `OPENAI_API_KEY`
/// - Anthropic (Claude) - `ANTHROPIC_API_KEY`
/// - Gemini (Google) - `GEMINI_API_KEY`
/// - OpenRouter (Gateway) - `OPENROUTER_API_KEY`
/// - Grok (xAI) - `XAI_API_KEY`
/// - DeepSeek - `DEEPSEEK_API_KEY`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Groq,
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    Gemini,
    OpenRouter,
    Grok,
    DeepSeek,
}

impl LlmProvider {
    /// Get all available providers
    pub fn all() -> Vec<LlmProvider> {
        vec![
            LlmProvider::Groq,
            LlmProvider::OpenAI,
            LlmProvider::Anthropic,
            LlmProvider::Gemini,
            LlmProvider::OpenRouter,
            LlmProvider::Grok,
            LlmProvider::DeepSeek,
        ]
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "Groq",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::Gemini => "Gemini",
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::Grok => "Grok",
            LlmProvider::DeepSeek => "DeepSeek",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "groq",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenRouter => "openrouter",
            LlmProvider::Grok => "grok",
            LlmProvider::DeepSeek => "deepseek",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|p| p.as_str() == s.trim().to_ascii_lowercase())
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Grok => "XAI_API_KEY",
            LlmProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Whether this provider supports custom base URL
    pub fn supports_base_url(&self) -> bool {
        matches!(self, LlmProvider::Groq | LlmProvider::OpenAI)
    }

    /// Whether requests go through the chat-completions client (and honour sampling parameters)
    pub fn uses_chat_completions(&self) -> bool {
        self.supports_base_url()
    }

    /// Default endpoint for OpenAI-compatible providers
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Groq => Some("https://api.groq.com/openai/v1"),
            LlmProvider::OpenAI => Some("https://api.openai.com/v1"),
            _ => None,
        }
    }
}

/// Configuration for LLM model selection
///
/// ## Example
/// ```rust,ignore
/// use voyager_core::models::{ModelConfig, LlmProvider};
///
/// // Default Groq llama3
/// let config = ModelConfig::default();
///
/// // Specific provider and model
/// let config = ModelConfig::with_provider(LlmProvider::Anthropic, "claude-sonnet-4-20250514");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// LLM provider to use
    pub provider: LlmProvider,
    /// Model name (e.g., "llama3-8b-8192", "gpt-4o")
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs
    pub base_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            model: "llama3-8b-8192".to_string(),
            base_url: None,
        }
    }
}

impl ModelConfig {
    /// Create a new model config with default provider (Groq)
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Groq,
            model: model.into(),
            base_url: None,
        }
    }

    /// Create config for a specific provider
    pub fn with_provider(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            base_url: None,
        }
    }

    /// Set base URL (for OpenAI-compatible endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Base URL in effect: the override, else the provider default
    pub fn effective_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.provider.default_base_url().map(str::to_string))
    }

    /// `provider/model`, as shown in logs
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.provider.as_str(), self.model)
    }
}
