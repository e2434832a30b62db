//! Downloadable itinerary, rendered as Markdown.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::planner::{TravelPlan, TripOverview};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TravelPlanDocument {
    pub destination: String,
    pub budget: u32,
    pub interests: Vec<String>,
    pub weather: Option<String>,
    pub plan: String,
    pub generated_at: DateTime<Utc>,
}

impl TravelPlanDocument {
    pub fn new(overview: &TripOverview, plan: &TravelPlan) -> Self {
        Self {
            destination: plan.destination.clone(),
            budget: overview.request.budget,
            interests: overview.request.interests.clone(),
            weather: overview.weather.as_ref().map(|w| w.summary()),
            plan: plan.plan.clone(),
            generated_at: Utc::now(),
        }
    }

    /// `Paris_travel_plan.md`; anything but ASCII letters, digits, `-` and `_` becomes `_`
    /// so the name is safe in a `Content-Disposition` header
    pub fn file_name(&self) -> String {
        let stem: String = self
            .destination
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_travel_plan.md", stem)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Travel Plan for {}\n\n", self.destination);
        out.push_str(&format!("- **Budget:** ${}\n", self.budget));
        out.push_str(&format!("- **Interests:** {}\n", self.interests.join(", ")));
        if let Some(weather) = &self.weather {
            out.push_str(&format!("- **Weather:** {}\n", weather));
        }
        out.push_str(&format!(
            "- **Generated:** {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        out.push_str(self.plan.trim_end());
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(destination: &str) -> TravelPlanDocument {
        TravelPlanDocument {
            destination: destination.to_string(),
            budget: 2000,
            interests: vec!["Food".to_string(), "Nature".to_string()],
            weather: Some("clear sky - 21.5°C".to_string()),
            plan: "Day 1: Hike\nDay 2: Eat\n\n".to_string(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(document("Paris").file_name(), "Paris_travel_plan.md");
        assert_eq!(document("New York, NY").file_name(), "New_York__NY_travel_plan.md");
    }

    #[test]
    fn test_file_name_is_ascii() {
        let name = document("São Paulo").file_name();
        assert_eq!(name, "S_o_Paulo_travel_plan.md");
        assert!(name.is_ascii());
        assert_eq!(document("東京").file_name(), "___travel_plan.md");
    }

    #[test]
    fn test_generated_at_schema() {
        let schema = serde_json::to_value(schemars::schema_for!(TravelPlanDocument)).unwrap();
        let generated_at = &schema["properties"]["generated_at"];
        assert_eq!(generated_at["type"], "string");
        assert_eq!(generated_at["format"], "date-time");
    }

    #[test]
    fn test_markdown_layout() {
        let md = document("Kyoto").to_markdown();
        assert!(md.starts_with("# Travel Plan for Kyoto\n\n"));
        assert!(md.contains("- **Budget:** $2000\n"));
        assert!(md.contains("- **Interests:** Food, Nature\n"));
        assert!(md.contains("- **Weather:** clear sky - 21.5°C\n"));
        assert!(md.ends_with("Day 1: Hike\nDay 2: Eat\n"));
    }

    #[test]
    fn test_markdown_without_weather() {
        let mut doc = document("Oslo");
        doc.weather = None;
        assert!(!doc.to_markdown().contains("Weather"));
    }
}
