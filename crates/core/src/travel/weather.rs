//! Current weather from OpenWeather, in metric units.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::TravelApiClient;
use super::error::FetchError;

const SERVICE: &str = "OpenWeather";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeatherReport {
    pub description: String,
    pub temperature_c: f64,
    pub feels_like_c: Option<f64>,
    pub humidity: Option<u64>,
    pub location: Option<String>,
}

impl WeatherReport {
    /// "clear sky - 21.5°C"
    pub fn summary(&self) -> String {
        format!("{} - {}°C", self.description, self.temperature_c)
    }
}

/// Extract the report from an OpenWeather `/weather` body
pub fn parse_weather(body: &Value) -> Result<WeatherReport, FetchError> {
    let description = body
        .get("weather")
        .and_then(|w| w.get(0))
        .and_then(|w| w.get("description"))
        .and_then(|d| d.as_str())
        .ok_or_else(|| FetchError::decode(SERVICE, "missing weather[0].description"))?;
    let main = body
        .get("main")
        .ok_or_else(|| FetchError::decode(SERVICE, "missing main"))?;
    let temperature_c = main
        .get("temp")
        .and_then(|t| t.as_f64())
        .ok_or_else(|| FetchError::decode(SERVICE, "missing main.temp"))?;

    Ok(WeatherReport {
        description: description.to_string(),
        temperature_c,
        feels_like_c: main.get("feels_like").and_then(|t| t.as_f64()),
        humidity: main.get("humidity").and_then(|h| h.as_u64()),
        location: body.get("name").and_then(|n| n.as_str()).map(str::to_string),
    })
}

impl TravelApiClient {
    /// Current weather at `destination`
    pub async fn get_weather_info(&self, destination: &str) -> Result<WeatherReport, FetchError> {
        let key = Self::require_key(SERVICE, &self.keys.openweather)?;
        let request = self.http.get(&self.settings.weather_url).query(&[
            ("q", destination),
            ("appid", key),
            ("units", "metric"),
        ]);

        let body = self.get_json(SERVICE, request).await?;
        let report = parse_weather(&body)?;
        tracing::debug!(destination, summary = %report.summary(), "Fetched weather");
        Ok(report)
    }
}
