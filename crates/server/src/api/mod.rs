//! # HTTP API
//!
//! Versioned routes under `/api/v1`, grouped by concern.

pub mod config;
pub mod error;
pub mod nlp;
pub mod sessions;
pub mod trips;

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};

use crate::SharedState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions: usize,
    pub model: String,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Voyager API",
        version = "0.1.0",
        description = "Travel planning assistant: trip overviews, itineraries, chat with conversation memory"
    ),
    paths(
        health,
        sessions::create_session,
        sessions::list_sessions,
        sessions::end_session,
        sessions::get_history,
        sessions::retrieve_context,
        sessions::chat,
        sessions::create_itinerary,
        sessions::download_itinerary,
        trips::trip_overview,
        trips::get_budget,
        trips::list_interests,
        nlp::sentiment,
        nlp::intent,
        nlp::entities,
        nlp::language,
        config::get_config,
        config::update_config,
        config::get_providers,
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "sessions", description = "Sessions, memory, chat and itineraries"),
        (name = "trips", description = "Trip overview and budget"),
        (name = "nlp", description = "Text analysis"),
        (name = "config", description = "Configuration management"),
        (name = "providers", description = "LLM provider discovery")
    )
)]
pub struct ApiDoc;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.sessions.len().await,
        model: state.llm.read().await.model_name(),
    })
}

async fn serve_openapi() -> impl IntoResponse {
    let spec = ApiDoc::openapi().to_json().unwrap_or_default();
    ([(header::CONTENT_TYPE, "application/json")], spec)
}

/// Full application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/sessions", sessions::session_routes())
        .nest("/api/v1/trips", trips::trip_routes())
        .nest("/api/v1/nlp", nlp::nlp_routes())
        .route("/api/v1/budget", get(trips::get_budget))
        .route(
            "/api/v1/config",
            get(config::get_config).patch(config::update_config),
        )
        .route("/api/v1/providers", get(config::get_providers))
        .route("/api/v1/openapi.json", get(serve_openapi))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
