//! Travel-guide recommendations from Serper web search.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::TravelApiClient;
use super::error::FetchError;

const SERVICE: &str = "Serper";
const NUM_RESULTS: &str = "10";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Organic results whose title mentions "travel" or "guide"
pub fn parse_recommendations(body: &Value) -> Vec<Recommendation> {
    body.get("organic")
        .and_then(|o| o.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let title = item.get("title").and_then(|t| t.as_str()).unwrap_or("");
                    let lowered = title.to_lowercase();
                    if !(lowered.contains("travel") || lowered.contains("guide")) {
                        return None;
                    }
                    Some(Recommendation {
                        title: title.to_string(),
                        link: item
                            .get("link")
                            .or_else(|| item.get("url"))
                            .and_then(|l| l.as_str())
                            .unwrap_or("#")
                            .to_string(),
                        snippet: item
                            .get("snippet")
                            .and_then(|s| s.as_str())
                            .unwrap_or("No description available")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

impl TravelApiClient {
    /// Travel-guide pages for `destination`
    pub async fn get_destination_recommendations(
        &self,
        destination: &str,
    ) -> Result<Vec<Recommendation>, FetchError> {
        let key = Self::require_key(SERVICE, &self.keys.serper)?;
        let query = format!("{} travel guide", destination);
        let request = self
            .http
            .get(&self.settings.search_url)
            .header("X-API-KEY", key)
            .header("Content-Type", "application/json")
            .query(&[("q", query.as_str()), ("num", NUM_RESULTS)]);

        let body = self.get_json(SERVICE, request).await?;
        let recommendations = parse_recommendations(&body);
        tracing::debug!(destination, count = recommendations.len(), "Fetched recommendations");
        Ok(recommendations)
    }
}
