//! # Session API
//!
//! Session lifecycle, conversation memory, chat, and itinerary generation.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use voyager_core::chat::{handle_message, ChatExchange};
use voyager_core::memory::ConversationTurn;
use voyager_core::session::SessionSummary;
use voyager_core::travel::{gather_trip_overview, generate_travel_plan, TripRequest};

use super::error::{ApiError, ApiResult, ErrorBody};
use super::trips::TripRequestBody;
use crate::SharedState;

/// Characters of the user message shown in history previews
const PREVIEW_CHARS: usize = 30;

pub fn session_routes() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/:id", delete(end_session))
        .route("/:id/history", get(get_history))
        .route("/:id/context", post(retrieve_context))
        .route("/:id/chat", post(chat))
        .route("/:id/itinerary", post(create_itinerary))
        .route("/:id/itinerary/download", get(download_itinerary))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub turns: usize,
    pub plans: usize,
}

impl From<SessionSummary> for SessionResponse {
    fn from(s: SessionSummary) -> Self {
        Self {
            id: s.id,
            created_at: s.created_at,
            last_active: s.last_active,
            turns: s.turns,
            plans: s.plans,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EndSessionResponse {
    pub id: String,
    pub turns_cleared: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Number of most recent turns, defaults to the configured `recent_history`
    pub n: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub id: String,
    pub sequence: u64,
    pub user_message: String,
    pub ai_response: String,
    pub preview: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<ConversationTurn> for HistoryEntry {
    fn from(turn: ConversationTurn) -> Self {
        Self {
            preview: turn.preview(PREVIEW_CHARS),
            id: turn.id,
            sequence: turn.sequence,
            user_message: turn.user_message,
            ai_response: turn.ai_response,
            recorded_at: turn.recorded_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub turns: Vec<HistoryEntry>,
    pub total: usize,
    pub max_history: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContextRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContextResponse {
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    #[schema(value_type = Object)]
    pub exchange: ChatExchange,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItineraryResponse {
    pub destination: String,
    pub plan: String,
    /// True when the model failed and a fixed apology was returned
    pub fallback: bool,
    /// Whether the plan was added to the session's memory
    pub stored: bool,
    pub download_name: Option<String>,
}

/// Start a session
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created", body = SessionResponse)
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state.sessions.create().await?;
    let summary = session.lock().await.summary();
    Ok((StatusCode::CREATED, Json(summary.into())))
}

/// List live sessions
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Live sessions, oldest first", body = SessionListResponse)
    )
)]
pub async fn list_sessions(State(state): State<SharedState>) -> Json<SessionListResponse> {
    let sessions = state
        .sessions
        .list()
        .await
        .into_iter()
        .map(SessionResponse::from)
        .collect();
    Json(SessionListResponse { sessions })
}

/// End a session and clear its memory
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session ended", body = EndSessionResponse),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn end_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<EndSessionResponse> {
    let turns_cleared = state.sessions.end(&id).await?;
    Ok(Json(EndSessionResponse { id, turns_cleared }))
}

/// Most recent turns, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/history",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id"), HistoryQuery),
    responses(
        (status = 200, description = "Recent history", body = HistoryResponse),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn get_history(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<HistoryResponse> {
    let default_n = state.config.read().await.memory.recent_history;
    let session = state.sessions.get(&id).await?;
    let session = session.lock().await;

    let turns = session
        .memory
        .get_recent_history(query.n.unwrap_or(default_n))
        .into_iter()
        .map(HistoryEntry::from)
        .collect();

    Ok(Json(HistoryResponse {
        turns,
        total: session.memory.len(),
        max_history: session.memory.max_history(),
    }))
}

/// Past turns most similar to a query
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/context",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    request_body = ContextRequest,
    responses(
        (status = 200, description = "Relevant documents, closest first", body = ContextResponse),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn retrieve_context(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<ContextRequest>,
) -> ApiResult<ContextResponse> {
    let top_k = match req.top_k {
        Some(k) => k,
        None => state.config.read().await.memory.top_k,
    };
    let session = state.sessions.get(&id).await?;
    let documents = session
        .lock()
        .await
        .memory
        .retrieve_relevant_context(&req.query, top_k)?;
    Ok(Json(ContextResponse { documents }))
}

/// Send a chat message
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/chat",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply with analysis", body = ChatResponse),
        (status = 404, description = "Unknown session", body = ErrorBody),
        (status = 422, description = "Empty message", body = ErrorBody),
        (status = 502, description = "Language model failed, nothing stored", body = ErrorBody)
    )
)]
pub async fn chat(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    let top_k = state.config.read().await.memory.top_k;
    let nlp = state.nlp.read().await.clone();
    let llm = state.llm.read().await.clone();

    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;
    let exchange = handle_message(&mut session.memory, &nlp, llm.as_ref(), &req.message, top_k).await?;
    session.touch();

    Ok(Json(ChatResponse { exchange }))
}

/// Generate an itinerary and remember it in the session
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/itinerary",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    request_body = TripRequestBody,
    responses(
        (status = 200, description = "Generated plan", body = ItineraryResponse),
        (status = 404, description = "Unknown session", body = ErrorBody),
        (status = 422, description = "Invalid trip or missing weather/attractions", body = ErrorBody)
    )
)]
pub async fn create_itinerary(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<TripRequestBody>,
) -> ApiResult<ItineraryResponse> {
    let request = TripRequest::from(body).validate()?;
    let session = state.sessions.get(&id).await?;

    let travel = state.travel.read().await.clone();
    let overview = gather_trip_overview(&travel, request).await;
    let llm = state.llm.read().await.clone();
    let plan = generate_travel_plan(llm.as_ref(), &overview).await?;

    let mut session = session.lock().await;
    let download_name = if plan.fallback {
        None
    } else {
        Some(session.record_plan(&overview, &plan)?.file_name())
    };
    session.touch();

    Ok(Json(ItineraryResponse {
        destination: plan.destination,
        plan: plan.plan,
        fallback: plan.fallback,
        stored: download_name.is_some(),
        download_name,
    }))
}

/// Markdown export of the session's latest plan
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/itinerary/download",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Markdown document", content_type = "text/markdown", body = String),
        (status = 404, description = "Unknown session or no plan yet", body = ErrorBody)
    )
)]
pub async fn download_itinerary(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = state.sessions.get(&id).await?;
    let session = session.lock().await;
    let document = session
        .last_plan()
        .ok_or_else(|| ApiError::not_found("no_plan", "No travel plan has been generated yet"))?;

    let disposition = format!("attachment; filename=\"{}\"", document.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.to_markdown(),
    )
        .into_response())
}
