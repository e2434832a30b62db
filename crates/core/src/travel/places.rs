//! Tourist attractions from the Foursquare places search.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::TravelApiClient;
use super::error::FetchError;

const SERVICE: &str = "Foursquare";
const QUERY: &str = "tourist attractions";
const LIMIT: &str = "10";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Attraction {
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
}

/// Extract attractions from a places-search body. A body without `results` has none.
pub fn parse_attractions(body: &Value) -> Result<Vec<Attraction>, FetchError> {
    let Some(results) = body.get("results") else {
        return Ok(Vec::new());
    };
    let results = results
        .as_array()
        .ok_or_else(|| FetchError::decode(SERVICE, "results is not an array"))?;

    Ok(results
        .iter()
        .map(|place| Attraction {
            name: place
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("Unnamed Attraction")
                .to_string(),
            category: place
                .get("categories")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("name"))
                .and_then(|n| n.as_str())
                .map(str::to_string),
            address: place
                .get("location")
                .and_then(|l| l.get("formatted_address"))
                .and_then(|a| a.as_str())
                .map(str::to_string),
        })
        .collect())
}

impl TravelApiClient {
    /// Up to ten tourist attractions near `destination`
    pub async fn get_attractions(&self, destination: &str) -> Result<Vec<Attraction>, FetchError> {
        let key = Self::require_key(SERVICE, &self.keys.foursquare)?;
        let request = self
            .http
            .get(&self.settings.places_url)
            .header("Accept", "application/json")
            .header("Authorization", key)
            .query(&[("query", QUERY), ("near", destination), ("limit", LIMIT)]);

        let body = self.get_json(SERVICE, request).await?;
        let attractions = parse_attractions(&body)?;
        tracing::debug!(destination, count = attractions.len(), "Fetched attractions");
        Ok(attractions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_attractions() {
        let body = json!({
            "results": [
                {
                    "name": "Louvre Museum",
                    "categories": [{"id": 10027, "name": "Art Museum"}],
                    "location": {"formatted_address": "Rue de Rivoli, 75001 Paris"}
                },
                {"fsq_id": "abc"}
            ]
        });
        let attractions = parse_attractions(&body).unwrap();
        assert_eq!(attractions.len(), 2);
        assert_eq!(attractions[0].name, "Louvre Museum");
        assert_eq!(attractions[0].category.as_deref(), Some("Art Museum"));
        assert_eq!(attractions[1].name, "Unnamed Attraction");
        assert_eq!(attractions[1].address, None);
    }

    #[test]
    fn test_parse_without_results() {
        assert!(parse_attractions(&json!({})).unwrap().is_empty());
        let err = parse_attractions(&json!({"results": "nope"})).unwrap_err();
        assert_eq!(err.kind(), "decode");
    }
}
