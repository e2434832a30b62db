//! # Voyager Configuration
//!
//! Layered configuration: built-in defaults, then `.voyager/config.json`,
//! then `VOYAGER_*` environment variables. API keys are never written to the
//! config file; they are read from the environment (a `.env` file is loaded
//! by the binary).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::memory::{EmbedderKind, DEFAULT_MAX_HISTORY, DEFAULT_RECENT, DEFAULT_TOP_K};
use crate::models::{LlmProvider, ModelConfig};
use crate::nlp::SentimentThresholds;
use crate::state::db::DEFAULT_DB_PATH;

/// Default config file location
pub const CONFIG_PATH: &str = ".voyager/config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Conversation memory settings, applied to sessions created afterwards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemorySettings {
    pub max_history: usize,
    pub top_k: usize,
    pub recent_history: usize,
    pub embedder: EmbedderKind,
    /// Keep vectors in the SQLite database instead of process memory
    pub persist_vectors: bool,
    pub db_path: String,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            top_k: DEFAULT_TOP_K,
            recent_history: DEFAULT_RECENT,
            embedder: EmbedderKind::default(),
            persist_vectors: true,
            db_path: DEFAULT_DB_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    /// Idle time after which a session is torn down
    pub ttl_minutes: u64,
    pub cleanup_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: 60,
            cleanup_interval_secs: 300,
        }
    }
}

/// Third-party travel data endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TravelApiSettings {
    pub weather_url: String,
    pub places_url: String,
    pub search_url: String,
    pub http_timeout_secs: u64,
}

impl Default for TravelApiSettings {
    fn default() -> Self {
        Self {
            weather_url: "http://api.openweathermap.org/data/2.5/weather".to_string(),
            places_url: "https://api.foursquare.com/v3/places/search".to_string(),
            search_url: "https://google.serper.dev/search".to_string(),
            http_timeout_secs: 30,
        }
    }
}

/// Complete Voyager configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct VoyagerConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub memory: MemorySettings,
    pub sessions: SessionSettings,
    pub apis: TravelApiSettings,
    pub sentiment: SentimentThresholds,
}

impl VoyagerConfig {
    /// Load from `.voyager/config.json` and apply environment overrides
    pub async fn load() -> Self {
        let mut config = Self::load_from(CONFIG_PATH).await;
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load a config file, falling back to defaults when missing or unreadable
    pub async fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match tokio::fs::read_to_string(path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable config file, using defaults");
                Self::default()
            }
        }
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to(CONFIG_PATH).await
    }

    pub async fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Apply `VOYAGER_*` overrides. Unparseable values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("VOYAGER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("VOYAGER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid VOYAGER_PORT"),
            }
        }
        if let Some(provider) = lookup("VOYAGER_PROVIDER") {
            match LlmProvider::from_str(&provider) {
                Some(provider) => self.model.provider = provider,
                None => tracing::warn!(value = %provider, "Ignoring unknown VOYAGER_PROVIDER"),
            }
        }
        if let Some(model) = lookup("VOYAGER_MODEL") {
            self.model.model = model;
        }
        if let Some(base_url) = lookup("VOYAGER_BASE_URL") {
            self.model.base_url = Some(base_url);
        }
        if let Some(kind) = lookup("VOYAGER_EMBEDDER") {
            match EmbedderKind::from_str(&kind) {
                Some(kind) => self.memory.embedder = kind,
                None => tracing::warn!(value = %kind, "Ignoring unknown VOYAGER_EMBEDDER"),
            }
        }
        if let Some(max) = lookup("VOYAGER_MAX_HISTORY") {
            match max.parse::<usize>() {
                Ok(max) if max > 0 => self.memory.max_history = max,
                _ => tracing::warn!(value = %max, "Ignoring invalid VOYAGER_MAX_HISTORY"),
            }
        }
        if let Some(path) = lookup("VOYAGER_DB_PATH") {
            self.memory.db_path = path;
        }
    }

    /// Apply a partial update
    pub fn merge(&mut self, update: ConfigUpdate) {
        if let Some(provider) = update.provider {
            self.model.provider = provider;
        }
        if let Some(model) = update.model {
            self.model.model = model;
        }
        if update.base_url.is_some() {
            self.model.base_url = update.base_url;
        }
        if let Some(max_history) = update.max_history {
            self.memory.max_history = max_history.max(1);
        }
        if let Some(top_k) = update.top_k {
            self.memory.top_k = top_k;
        }
        if let Some(embedder) = update.embedder {
            self.memory.embedder = embedder;
        }
        if let Some(ttl) = update.session_ttl_minutes {
            self.sessions.ttl_minutes = ttl;
        }
        if let Some(timeout) = update.http_timeout_secs {
            self.apis.http_timeout_secs = timeout;
        }
        if let Some(thresholds) = update.sentiment {
            self.sentiment = thresholds;
        }
    }
}

/// Partial configuration accepted by `PATCH /api/v1/config`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigUpdate {
    pub provider: Option<LlmProvider>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_history: Option<usize>,
    pub top_k: Option<usize>,
    pub embedder: Option<EmbedderKind>,
    pub session_ttl_minutes: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    pub sentiment: Option<SentimentThresholds>,
}

/// Third-party API keys, read from the environment only
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub openweather: Option<String>,
    pub foursquare: Option<String>,
    pub serper: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            openweather: read("OPENWEATHER_API_KEY"),
            foursquare: read("FOURSQUARE_API_KEY"),
            serper: read("SERPER_API_KEY"),
        }
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("openweather", &mask(&self.openweather))
            .field("foursquare", &mask(&self.foursquare))
            .field("serper", &mask(&self.serper))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = VoyagerConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.memory.max_history, 50);
        assert_eq!(config.memory.top_k, 3);
        assert_eq!(config.memory.recent_history, 5);
        assert_eq!(config.memory.embedder, EmbedderKind::Fastembed);
        assert_eq!(config.sessions.ttl_minutes, 60);
        assert_eq!(config.model.model, "llama3-8b-8192");
        assert_eq!(config.sentiment, SentimentThresholds::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: VoyagerConfig =
            serde_json::from_str(r#"{"memory": {"max_history": 10}, "server": {"port": 8080}}"#)
                .unwrap();
        assert_eq!(config.memory.max_history, 10);
        assert_eq!(config.memory.top_k, 3);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VOYAGER_PORT", "4100"),
            ("VOYAGER_PROVIDER", "anthropic"),
            ("VOYAGER_MODEL", "claude-sonnet-4-20250514"),
            ("VOYAGER_MAX_HISTORY", "0"),
            ("VOYAGER_EMBEDDER", "hashing"),
        ]
        .into_iter()
        .collect();

        let mut config = VoyagerConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 4100);
        assert_eq!(config.model.provider, LlmProvider::Anthropic);
        assert_eq!(config.model.model, "claude-sonnet-4-20250514");
        assert_eq!(config.memory.max_history, 50);
        assert_eq!(config.memory.embedder, EmbedderKind::Hashing);
    }

    #[test]
    fn test_merge() {
        let mut config = VoyagerConfig::default();
        config.merge(ConfigUpdate {
            model: Some("llama3-70b-8192".to_string()),
            max_history: Some(0),
            top_k: Some(5),
            ..Default::default()
        });
        assert_eq!(config.model.model, "llama3-70b-8192");
        assert_eq!(config.model.provider, LlmProvider::Groq);
        assert_eq!(config.memory.max_history, 1);
        assert_eq!(config.memory.top_k, 5);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let path = ".voyager/test_config.json";
        let _ = fs::remove_file(path);

        assert_eq!(VoyagerConfig::load_from(path).await, VoyagerConfig::default());

        let mut config = VoyagerConfig::default();
        config.server.port = 9999;
        config.save_to(path).await.unwrap();

        let loaded = VoyagerConfig::load_from(path).await;
        assert_eq!(loaded.server.port, 9999);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_api_keys_are_masked() {
        let keys = ApiKeys::from_lookup(|key| match key {
            "SERPER_API_KEY" => Some("secret".to_string()),
            "FOURSQUARE_API_KEY" => Some("  ".to_string()),
            _ => None,
        });
        assert!(keys.serper.is_some());
        assert!(keys.foursquare.is_none());
        let debug = format!("{:?}", keys);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<set>"));
    }
}
