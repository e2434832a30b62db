//! # Trip Planner
//!
//! Validates the trip form, gathers weather, attractions and recommendations
//! concurrently, and asks the model for a day-by-day itinerary.
//!
//! Fetch failures never abort the overview: each one becomes a
//! [`ServiceWarning`] next to an empty result. Itinerary generation needs
//! weather and at least one attraction; a model failure is replaced by
//! [`PLAN_FALLBACK`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::budget::{estimate_trip_budget, BudgetEstimate, BudgetShare, DEFAULT_DURATION_DAYS};
use super::client::TravelApiClient;
use super::error::{FetchError, PlanError, TripRequestError};
use super::places::Attraction;
use super::search::Recommendation;
use super::weather::WeatherReport;
use crate::llm::{prompts, ChatMessage, CompletionService, SamplingParams};

/// Smallest accepted budget, in USD
pub const MIN_BUDGET_USD: u32 = 100;

/// Days covered by a generated itinerary
pub const ITINERARY_DAYS: u32 = 5;

/// Recommendations shown per overview
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Reply used when the model cannot produce a plan
pub const PLAN_FALLBACK: &str = "Sorry, there was an error generating your travel plan.";

/// Interests offered by the trip form
pub const INTERESTS: &[&str] = &[
    "Culture",
    "Food",
    "Adventure",
    "Nature",
    "History",
    "Nightlife",
    "Shopping",
    "Wellness",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TripRequest {
    pub destination: String,
    /// USD
    pub budget: u32,
    pub interests: Vec<String>,
    /// Days used for the budget estimate
    #[serde(default)]
    pub duration_days: Option<u64>,
}

impl TripRequest {
    /// Trim the destination and normalise interest names to their canonical spelling
    pub fn validate(mut self) -> Result<Self, TripRequestError> {
        self.destination = self.destination.trim().to_string();
        if self.destination.is_empty() {
            return Err(TripRequestError::MissingDestination);
        }
        if self.budget < MIN_BUDGET_USD {
            return Err(TripRequestError::BudgetTooLow {
                minimum: MIN_BUDGET_USD,
            });
        }
        if self.interests.is_empty() {
            return Err(TripRequestError::NoInterests);
        }

        let mut interests = Vec::with_capacity(self.interests.len());
        for interest in &self.interests {
            let canonical = INTERESTS
                .iter()
                .find(|known| known.eq_ignore_ascii_case(interest.trim()))
                .ok_or_else(|| TripRequestError::UnknownInterest(interest.clone()))?;
            if !interests.iter().any(|i: &String| i == canonical) {
                interests.push(canonical.to_string());
            }
        }
        self.interests = interests;
        Ok(self)
    }

    pub fn duration(&self) -> u64 {
        self.duration_days.unwrap_or(DEFAULT_DURATION_DAYS)
    }
}

/// A travel service that failed while building an overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceWarning {
    pub service: String,
    pub kind: String,
    pub message: String,
}

impl From<&FetchError> for ServiceWarning {
    fn from(e: &FetchError) -> Self {
        Self {
            service: e.service().to_string(),
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Everything the planner page shows before an itinerary is requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TripOverview {
    pub request: TripRequest,
    pub weather: Option<WeatherReport>,
    pub attractions: Vec<Attraction>,
    pub recommendations: Vec<Recommendation>,
    pub budget: Option<BudgetEstimate>,
    pub budget_shares: Vec<BudgetShare>,
    pub warnings: Vec<ServiceWarning>,
}

impl TripOverview {
    /// Weather plus at least one attraction
    pub fn can_plan(&self) -> bool {
        self.weather.is_some() && !self.attractions.is_empty()
    }
}

/// Fetch the three data sources concurrently and estimate the budget
pub async fn gather_trip_overview(client: &TravelApiClient, request: TripRequest) -> TripOverview {
    let destination = request.destination.as_str();
    let (weather, attractions, recommendations) = tokio::join!(
        client.get_weather_info(destination),
        client.get_attractions(destination),
        client.get_destination_recommendations(destination),
    );

    let mut warnings = Vec::new();
    let weather = weather
        .map_err(|e| warnings.push(ServiceWarning::from(&e)))
        .ok();
    let attractions = attractions
        .map_err(|e| warnings.push(ServiceWarning::from(&e)))
        .unwrap_or_default();
    let mut recommendations = recommendations
        .map_err(|e| warnings.push(ServiceWarning::from(&e)))
        .unwrap_or_default();
    recommendations.truncate(MAX_RECOMMENDATIONS);

    let budget = match estimate_trip_budget(destination, request.duration()) {
        Ok(budget) => Some(budget),
        Err(e) => {
            warnings.push(ServiceWarning {
                service: "Budget".to_string(),
                kind: "overflow".to_string(),
                message: e.to_string(),
            });
            None
        }
    };
    let budget_shares = budget.as_ref().map(|b| b.shares()).unwrap_or_default();

    for warning in &warnings {
        tracing::warn!(service = %warning.service, kind = %warning.kind, "Trip overview degraded: {}", warning.message);
    }

    TripOverview {
        request,
        weather,
        attractions,
        recommendations,
        budget,
        budget_shares,
        warnings,
    }
}

/// The itinerary prompt for a trip
pub fn build_itinerary_prompt(
    request: &TripRequest,
    weather: &WeatherReport,
    attractions: &[Attraction],
) -> String {
    let attraction_names: Vec<&str> = attractions.iter().map(|a| a.name.as_str()).collect();
    let attractions = attraction_names.join(", ");
    let budget = request.budget.to_string();
    let interests = request.interests.join(", ");
    let temperature = weather.temperature_c.to_string();
    let days = ITINERARY_DAYS.to_string();

    prompts::render(
        prompts::ITINERARY,
        &[
            ("destination", request.destination.as_str()),
            ("budget", budget.as_str()),
            ("interests", interests.as_str()),
            ("weather_description", weather.description.as_str()),
            ("temperature", temperature.as_str()),
            ("attractions", attractions.as_str()),
            ("days", days.as_str()),
        ],
    )
}

/// Result of an itinerary request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TravelPlan {
    pub destination: String,
    pub plan: String,
    /// True when the model failed and the fallback text was used
    pub fallback: bool,
}

/// Ask the model for an itinerary.
///
/// Model failures are logged and replaced by [`PLAN_FALLBACK`].
pub async fn generate_travel_plan(
    llm: &dyn CompletionService,
    overview: &TripOverview,
) -> Result<TravelPlan, PlanError> {
    let weather = match &overview.weather {
        Some(weather) if !overview.attractions.is_empty() => weather,
        _ => return Err(PlanError::MissingTripData),
    };

    let prompt = build_itinerary_prompt(&overview.request, weather, &overview.attractions);
    let messages = [ChatMessage::user(prompt)];

    let destination = overview.request.destination.clone();
    match llm.complete(&messages, &SamplingParams::itinerary()).await {
        Ok(plan) => {
            tracing::info!(destination = %destination, model = %llm.model_name(), "Generated travel plan");
            Ok(TravelPlan {
                destination,
                plan,
                fallback: false,
            })
        }
        Err(e) => {
            tracing::warn!(destination = %destination, error = %e, "Error generating travel plan");
            Ok(TravelPlan {
                destination,
                plan: PLAN_FALLBACK.to_string(),
                fallback: true,
            })
        }
    }
}

/// Memory label for a stored plan
pub fn plan_memory_label(destination: &str) -> String {
    format!("Travel Plan for {}", destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKeys, TravelApiSettings};
    use crate::llm::ScriptedCompletion;

    fn request() -> TripRequest {
        TripRequest {
            destination: "  Paris ".to_string(),
            budget: 1500,
            interests: vec!["food".to_string(), "History".to_string(), "Food".to_string()],
            duration_days: None,
        }
    }

    fn overview() -> TripOverview {
        TripOverview {
            request: request().validate().unwrap(),
            weather: Some(WeatherReport {
                description: "light rain".to_string(),
                temperature_c: 14.2,
                feels_like_c: None,
                humidity: None,
                location: Some("Paris".to_string()),
            }),
            attractions: vec![
                Attraction {
                    name: "Louvre Museum".to_string(),
                    category: None,
                    address: None,
                },
                Attraction {
                    name: "Eiffel Tower".to_string(),
                    category: None,
                    address: None,
                },
            ],
            recommendations: Vec::new(),
            budget: None,
            budget_shares: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_validate_normalises() {
        let valid = request().validate().unwrap();
        assert_eq!(valid.destination, "Paris");
        assert_eq!(valid.interests, vec!["Food", "History"]);
        assert_eq!(valid.duration(), 7);
    }

    #[test]
    fn test_validate_rejects() {
        let mut r = request();
        r.destination = "   ".to_string();
        assert_eq!(r.validate(), Err(TripRequestError::MissingDestination));

        let mut r = request();
        r.budget = 99;
        assert_eq!(
            r.validate(),
            Err(TripRequestError::BudgetTooLow { minimum: 100 })
        );

        let mut r = request();
        r.interests.clear();
        assert_eq!(r.validate(), Err(TripRequestError::NoInterests));

        let mut r = request();
        r.interests = vec!["Skiing".to_string()];
        assert_eq!(
            r.validate(),
            Err(TripRequestError::UnknownInterest("Skiing".to_string()))
        );
    }

    #[test]
    fn test_prompt_contents() {
        let overview = overview();
        let prompt = build_itinerary_prompt(
            &overview.request,
            overview.weather.as_ref().unwrap(),
            &overview.attractions,
        );
        assert!(prompt.starts_with("You are a friendly and knowledgeable travel guide."));
        assert!(prompt.contains("Destination: Paris"));
        assert!(prompt.contains("Budget: 1500"));
        assert!(prompt.contains("Interests: Food, History"));
        assert!(prompt.contains("Weather: light rain with a temperature of 14.2°C"));
        assert!(prompt.contains("Attractions: Louvre Museum, Eiffel Tower"));
        assert!(prompt.contains("engaging 5 day travel plan"));
    }

    #[tokio::test]
    async fn test_generate_sends_itinerary_params() {
        let llm = ScriptedCompletion::replying("Day 1: croissants");
        let plan = generate_travel_plan(&llm, &overview()).await.unwrap();
        assert_eq!(plan.plan, "Day 1: croissants");
        assert!(!plan.fallback);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, SamplingParams::itinerary());
        assert_eq!(requests[0].0[0].role, "user");
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_model_error() {
        let llm = ScriptedCompletion::failing();
        let plan = generate_travel_plan(&llm, &overview()).await.unwrap();
        assert_eq!(plan.plan, PLAN_FALLBACK);
        assert!(plan.fallback);
    }

    #[tokio::test]
    async fn test_generate_requires_weather_and_attractions() {
        let llm = ScriptedCompletion::replying("unused");

        let mut no_weather = overview();
        no_weather.weather = None;
        assert_eq!(
            generate_travel_plan(&llm, &no_weather).await,
            Err(PlanError::MissingTripData)
        );

        let mut no_attractions = overview();
        no_attractions.attractions.clear();
        assert!(!no_attractions.can_plan());
        assert_eq!(
            generate_travel_plan(&llm, &no_attractions).await,
            Err(PlanError::MissingTripData)
        );
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_overview_without_keys_degrades() {
        let client = TravelApiClient::new(TravelApiSettings::default(), ApiKeys::default()).unwrap();
        let overview = gather_trip_overview(&client, request().validate().unwrap()).await;

        assert!(overview.weather.is_none());
        assert!(overview.attractions.is_empty());
        assert_eq!(overview.warnings.len(), 3);
        assert!(overview.warnings.iter().all(|w| w.kind == "missing_api_key"));
        assert_eq!(overview.budget.as_ref().unwrap().total_estimated_budget, 1450);
        assert_eq!(overview.budget_shares.len(), 5);
        assert!(!overview.can_plan());
    }

    #[test]
    fn test_plan_memory_label() {
        assert_eq!(plan_memory_label("Rome"), "Travel Plan for Rome");
    }
}
