//! # Trip API
//!
//! Trip overview (weather, attractions, travel blogs, budget) and the
//! stand-alone budget estimate.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use voyager_core::travel::{
    estimate_trip_budget, gather_trip_overview, BudgetEstimate, BudgetShare, TripOverview,
    TripRequest, INTERESTS,
};

use super::error::{ApiResult, ErrorBody};
use crate::SharedState;

pub fn trip_routes() -> Router<SharedState> {
    Router::new()
        .route("/overview", post(trip_overview))
        .route("/interests", get(list_interests))
}

/// Trip form as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TripRequestBody {
    pub destination: String,
    /// USD, at least 100
    pub budget: u32,
    pub interests: Vec<String>,
    /// Days used for the budget estimate, defaults to 7
    pub duration_days: Option<u64>,
}

impl From<TripRequestBody> for TripRequest {
    fn from(body: TripRequestBody) -> Self {
        TripRequest {
            destination: body.destination,
            budget: body.budget,
            interests: body.interests,
            duration_days: body.duration_days,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TripOverviewResponse {
    #[schema(value_type = Object)]
    pub overview: TripOverview,
    /// Weather summary, e.g. "clear sky - 21.5°C"
    pub weather_summary: Option<String>,
    /// Whether an itinerary can be generated from this overview
    pub can_plan: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BudgetQuery {
    pub destination: String,
    /// Defaults to 7
    pub duration: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BudgetResponse {
    #[schema(value_type = Object)]
    pub estimate: BudgetEstimate,
    #[schema(value_type = Vec<Object>)]
    pub shares: Vec<BudgetShare>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InterestsResponse {
    pub interests: Vec<String>,
}

/// Weather, attractions, top travel blogs and budget for a destination
#[utoipa::path(
    post,
    path = "/api/v1/trips/overview",
    tag = "trips",
    request_body = TripRequestBody,
    responses(
        (status = 200, description = "Overview; failed services are listed as warnings", body = TripOverviewResponse),
        (status = 422, description = "Invalid trip request", body = ErrorBody)
    )
)]
pub async fn trip_overview(
    State(state): State<SharedState>,
    Json(body): Json<TripRequestBody>,
) -> ApiResult<TripOverviewResponse> {
    let request = TripRequest::from(body).validate()?;
    let travel = state.travel.read().await.clone();
    let overview = gather_trip_overview(&travel, request).await;

    Ok(Json(TripOverviewResponse {
        weather_summary: overview.weather.as_ref().map(|w| w.summary()),
        can_plan: overview.can_plan(),
        overview,
    }))
}

/// Flat-rate budget estimate
#[utoipa::path(
    get,
    path = "/api/v1/budget",
    tag = "trips",
    params(BudgetQuery),
    responses(
        (status = 200, description = "Budget estimate with category shares", body = BudgetResponse),
        (status = 422, description = "Duration overflows", body = ErrorBody)
    )
)]
pub async fn get_budget(Query(query): Query<BudgetQuery>) -> ApiResult<BudgetResponse> {
    let estimate = estimate_trip_budget(&query.destination, query.duration.unwrap_or(7))?;
    let shares = estimate.shares();
    Ok(Json(BudgetResponse { estimate, shares }))
}

/// Interests accepted by the trip form
#[utoipa::path(
    get,
    path = "/api/v1/trips/interests",
    tag = "trips",
    responses(
        (status = 200, description = "Accepted interests", body = InterestsResponse)
    )
)]
pub async fn list_interests() -> Json<InterestsResponse> {
    Json(InterestsResponse {
        interests: INTERESTS.iter().map(|i| i.to_string()).collect(),
    })
}
