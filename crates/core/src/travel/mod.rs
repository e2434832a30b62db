//! # Travel Module
//!
//! Trip planning around third-party data sources:
//!
//! - `client` - shared HTTP client and API keys
//! - `weather`, `places`, `search` - one wrapper per service
//! - `budget` - flat-rate cost estimate
//! - `planner` - trip form validation, overview gathering, itinerary generation
//! - `itinerary` - Markdown export of a generated plan

pub mod budget;
pub mod client;
pub mod error;
pub mod itinerary;
pub mod places;
pub mod planner;
pub mod search;
pub mod weather;

pub use budget::{estimate_trip_budget, BudgetEstimate, BudgetShare, CostBreakdown};
pub use client::TravelApiClient;
pub use error::{BudgetError, FetchError, PlanError, TripRequestError};
pub use itinerary::TravelPlanDocument;
pub use places::Attraction;
pub use planner::{
    gather_trip_overview, generate_travel_plan, plan_memory_label, ServiceWarning, TravelPlan,
    TripOverview, TripRequest, INTERESTS,
};
pub use search::Recommendation;
pub use weather::WeatherReport;
