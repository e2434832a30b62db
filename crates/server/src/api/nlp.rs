//! # NLP API
//!
//! Stateless text analysis endpoints. Empty text is rejected with 422.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use voyager_core::nlp::{
    EntitySummary, IntentAnalysis, LanguageGuess, SentimentAnalysis, SentimentThresholds,
};

use super::error::{ApiResult, ErrorBody};
use crate::SharedState;

pub fn nlp_routes() -> Router<SharedState> {
    Router::new()
        .route("/sentiment", post(sentiment))
        .route("/intent", post(intent))
        .route("/entities", post(entities))
        .route("/language", post(language))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SentimentRequest {
    pub text: String,
    /// Overrides the configured category thresholds
    #[schema(value_type = Option<Object>)]
    pub thresholds: Option<SentimentThresholds>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IntentRequest {
    pub text: String,
    /// Set false to skip keyword intents and only score sentiment
    #[serde(default = "default_true")]
    pub use_keywords: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SentimentResponse {
    #[schema(value_type = Object)]
    pub sentiment: SentimentAnalysis,
    /// Display colour hint for the category
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IntentResponse {
    #[schema(value_type = Object)]
    pub analysis: IntentAnalysis,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntitiesResponse {
    /// Entities grouped by label with occurrence counts
    #[schema(value_type = Object)]
    pub entities: EntitySummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LanguageResponse {
    #[schema(value_type = Object)]
    pub language: LanguageGuess,
}

/// Polarity, subjectivity and category
#[utoipa::path(
    post,
    path = "/api/v1/nlp/sentiment",
    tag = "nlp",
    request_body = SentimentRequest,
    responses(
        (status = 200, description = "Sentiment analysis", body = SentimentResponse),
        (status = 422, description = "Empty text", body = ErrorBody)
    )
)]
pub async fn sentiment(
    State(state): State<SharedState>,
    Json(req): Json<SentimentRequest>,
) -> ApiResult<SentimentResponse> {
    let sentiment = state
        .nlp
        .read()
        .await
        .analyze_sentiment(&req.text, req.thresholds.as_ref())?;
    Ok(Json(SentimentResponse {
        color: sentiment.sentiment_category.color().to_string(),
        sentiment,
    }))
}

/// Keyword intents plus sentiment
#[utoipa::path(
    post,
    path = "/api/v1/nlp/intent",
    tag = "nlp",
    request_body = IntentRequest,
    responses(
        (status = 200, description = "Detected intents", body = IntentResponse),
        (status = 422, description = "Empty text", body = ErrorBody)
    )
)]
pub async fn intent(
    State(state): State<SharedState>,
    Json(req): Json<IntentRequest>,
) -> ApiResult<IntentResponse> {
    let analysis = state
        .nlp
        .read()
        .await
        .analyze_conversation_intent(&req.text, req.use_keywords)?;
    Ok(Json(IntentResponse { analysis }))
}

/// Named entities grouped by label
#[utoipa::path(
    post,
    path = "/api/v1/nlp/entities",
    tag = "nlp",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Entity summary", body = EntitiesResponse),
        (status = 422, description = "Empty text", body = ErrorBody)
    )
)]
pub async fn entities(
    State(state): State<SharedState>,
    Json(req): Json<TextRequest>,
) -> ApiResult<EntitiesResponse> {
    let entities = state.nlp.read().await.extract_key_entities(&req.text)?;
    Ok(Json(EntitiesResponse { entities }))
}

/// Most likely language of the text
#[utoipa::path(
    post,
    path = "/api/v1/nlp/language",
    tag = "nlp",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Language guess", body = LanguageResponse),
        (status = 422, description = "Empty text", body = ErrorBody)
    )
)]
pub async fn language(
    State(state): State<SharedState>,
    Json(req): Json<TextRequest>,
) -> ApiResult<LanguageResponse> {
    let language = state.nlp.read().await.detect_language(&req.text)?;
    Ok(Json(LanguageResponse { language }))
}
