//! # Travel API Client
//!
//! Shared reqwest client for the weather, places and web-search services.
//! One GET per call, no retries.

use serde_json::Value;
use std::time::Duration;

use super::error::FetchError;
use crate::config::{ApiKeys, TravelApiSettings};

#[derive(Clone)]
pub struct TravelApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) keys: ApiKeys,
    pub(crate) settings: TravelApiSettings,
}

impl TravelApiClient {
    pub fn new(settings: TravelApiSettings, keys: ApiKeys) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("voyager/0.1")
            .timeout(Duration::from_secs(settings.http_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            keys,
            settings,
        })
    }

    pub fn settings(&self) -> &TravelApiSettings {
        &self.settings
    }

    pub(crate) fn require_key<'a>(
        service: &'static str,
        key: &'a Option<String>,
    ) -> Result<&'a str, FetchError> {
        key.as_deref()
            .ok_or(FetchError::MissingApiKey { service })
    }

    /// Send a request and decode a JSON body from a 2xx response
    pub(crate) async fn get_json(
        &self,
        service: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, FetchError> {
        let response = request.send().await.map_err(|e| FetchError::Transport {
            service,
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(service, status = status.as_u16(), "Travel API returned an error status");
            return Err(FetchError::Status {
                service,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::decode(service, e.to_string()))
    }
}
