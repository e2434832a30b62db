//! # Config API
//!
//! Read and patch the running configuration, and list LLM providers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use voyager_core::config::{ConfigUpdate, VoyagerConfig};
use voyager_core::memory::EmbedderKind;
use voyager_core::models::LlmProvider;
use voyager_core::nlp::SentimentThresholds;

use super::error::{ApiError, ApiResult, ErrorBody};
use crate::SharedState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfigResponse {
    #[schema(value_type = Object)]
    pub config: VoyagerConfig,
    /// Which third-party API keys are present in the environment
    pub api_keys: ApiKeyStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyStatus {
    pub llm: bool,
    pub openweather: bool,
    pub foursquare: bool,
    pub serper: bool,
}

/// Partial update; omitted fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ConfigUpdateBody {
    #[schema(value_type = Option<String>, example = "groq")]
    pub provider: Option<LlmProvider>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_history: Option<usize>,
    pub top_k: Option<usize>,
    #[schema(value_type = Option<String>, example = "hashing")]
    pub embedder: Option<EmbedderKind>,
    pub session_ttl_minutes: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    #[schema(value_type = Option<Object>)]
    pub sentiment: Option<SentimentThresholds>,
}

impl From<ConfigUpdateBody> for ConfigUpdate {
    fn from(body: ConfigUpdateBody) -> Self {
        ConfigUpdate {
            provider: body.provider,
            model: body.model,
            base_url: body.base_url,
            max_history: body.max_history,
            top_k: body.top_k,
            embedder: body.embedder,
            session_ttl_minutes: body.session_ttl_minutes,
            http_timeout_secs: body.http_timeout_secs,
            sentiment: body.sentiment,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub default_model: String,
    pub supports_base_url: bool,
    pub env_var: String,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
}

fn default_model(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Groq => "llama3-8b-8192",
        LlmProvider::OpenAI => "gpt-4o",
        LlmProvider::Anthropic => "claude-sonnet-4-20250514",
        LlmProvider::Gemini => "gemini-2.0-flash-exp",
        LlmProvider::OpenRouter => "anthropic/claude-3.5-sonnet",
        LlmProvider::Grok => "grok-2",
        LlmProvider::DeepSeek => "deepseek-chat",
    }
}

fn env_present(key: &str) -> bool {
    std::env::var(key)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

async fn config_response(state: &SharedState) -> ConfigResponse {
    let config = state.config.read().await.clone();
    let keys = &state.api_keys;
    ConfigResponse {
        api_keys: ApiKeyStatus {
            llm: env_present(config.model.provider.api_key_env()),
            openweather: keys.openweather.is_some(),
            foursquare: keys.foursquare.is_some(),
            serper: keys.serper.is_some(),
        },
        config,
    }
}

/// Current configuration
#[utoipa::path(
    get,
    path = "/api/v1/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration", body = ConfigResponse)
    )
)]
pub async fn get_config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    Json(config_response(&state).await)
}

/// Update configuration (partial merge)
#[utoipa::path(
    patch,
    path = "/api/v1/config",
    tag = "config",
    request_body = ConfigUpdateBody,
    responses(
        (status = 200, description = "Updated configuration", body = ConfigResponse),
        (status = 500, description = "Components could not be rebuilt", body = ErrorBody)
    )
)]
pub async fn update_config(
    State(state): State<SharedState>,
    Json(update): Json<ConfigUpdateBody>,
) -> ApiResult<ConfigResponse> {
    let mut config = state.config.read().await.clone();
    config.merge(update.into());

    state.apply_config(config).await.map_err(ApiError::internal)?;
    Ok(Json(config_response(&state).await))
}

/// Supported LLM providers
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "providers",
    responses(
        (status = 200, description = "List of supported LLM providers", body = ProvidersResponse)
    )
)]
pub async fn get_providers(State(state): State<SharedState>) -> Json<ProvidersResponse> {
    let active = state.config.read().await.model.provider;
    let providers = LlmProvider::all()
        .into_iter()
        .map(|p| ProviderInfo {
            id: p.as_str().to_string(),
            name: p.display_name().to_string(),
            default_model: default_model(p).to_string(),
            supports_base_url: p.supports_base_url(),
            env_var: p.api_key_env().to_string(),
            active: p == active,
        })
        .collect();
    Json(ProvidersResponse { providers })
}
