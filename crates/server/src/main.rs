//! Voyager Server
//!
//! Axum server exposing trip planning, chat with conversation memory, and
//! text analysis over a JSON API, plus a small CLI for offline use.

mod api;
mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::RwLock};
use tracing_subscriber::EnvFilter;

use voyager_core::config::{ApiKeys, VoyagerConfig, CONFIG_PATH};
use voyager_core::llm::{build_completion_service, CompletionService};
use voyager_core::memory::{build_embedder, InMemoryVectorIndex, SqliteVectorIndex, VectorIndex};
use voyager_core::nlp::NlpService;
use voyager_core::session::{SessionLimits, SessionManager};
use voyager_core::state::VoyagerDb;
use voyager_core::travel::TravelApiClient;

/// Application state
pub struct AppState {
    pub config: RwLock<VoyagerConfig>,
    /// Where PATCHed configuration is saved; `None` keeps changes in memory
    config_path: Option<PathBuf>,
    pub api_keys: ApiKeys,
    pub sessions: SessionManager,
    pub nlp: RwLock<NlpService>,
    pub llm: RwLock<Arc<dyn CompletionService>>,
    pub travel: RwLock<TravelApiClient>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        config: VoyagerConfig,
        config_path: Option<PathBuf>,
        api_keys: ApiKeys,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn CompletionService>,
    ) -> anyhow::Result<Self> {
        let sessions = SessionManager::new(
            build_embedder(config.memory.embedder),
            index,
            SessionLimits::from_settings(&config.memory, &config.sessions),
        );
        let travel = TravelApiClient::new(config.apis.clone(), api_keys.clone())?;

        Ok(Self {
            nlp: RwLock::new(NlpService::new(config.sentiment)),
            llm: RwLock::new(llm),
            travel: RwLock::new(travel),
            config: RwLock::new(config),
            config_path,
            api_keys,
            sessions,
        })
    }

    /// Swap in a new configuration, rebuilding the components it affects
    pub async fn apply_config(&self, config: VoyagerConfig) -> anyhow::Result<()> {
        let previous = self.config.read().await.clone();

        if config.model != previous.model || config.apis.http_timeout_secs != previous.apis.http_timeout_secs {
            let llm = build_completion_service(&config.model, config.apis.http_timeout_secs)?;
            tracing::info!(model = %llm.model_name(), "Completion service rebuilt");
            *self.llm.write().await = llm;
        }
        if config.apis != previous.apis {
            *self.travel.write().await = TravelApiClient::new(config.apis.clone(), self.api_keys.clone())?;
        }
        if config.memory.embedder != previous.memory.embedder {
            tracing::warn!(
                embedder = config.memory.embedder.as_str(),
                "Embedder change takes effect after restart"
            );
        }

        *self.nlp.write().await = NlpService::new(config.sentiment);
        self.sessions
            .set_limits(SessionLimits::from_settings(&config.memory, &config.sessions))
            .await;

        if let Some(path) = &self.config_path {
            config.save_to(path).await?;
        }
        *self.config.write().await = config;
        Ok(())
    }
}

#[derive(Parser, Clone)]
#[command(author, version, about = "Voyager - AI travel planning assistant")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Voyager server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
    },
    /// Print a trip overview, and optionally an itinerary
    Plan {
        #[arg(short, long)]
        destination: String,
        /// Budget in USD
        #[arg(short, long)]
        budget: u32,
        /// Interest, repeatable (Culture, Food, Adventure, ...)
        #[arg(short, long = "interest", required = true)]
        interests: Vec<String>,
        /// Trip length in days for the budget estimate
        #[arg(long)]
        duration: Option<u64>,
        /// Also generate a 5-day itinerary
        #[arg(long)]
        itinerary: bool,
    },
    /// Print a budget estimate
    Budget {
        #[arg(short, long)]
        destination: String,
        #[arg(long, default_value = "7")]
        duration: u64,
    },
    /// Run sentiment, intent, entity and language analysis on a text
    Analyze { text: String },
    /// Create `.voyager/` with a default config
    Init,
}

/// Open the vector index selected by the config. Stale collections are purged.
fn open_vector_index(config: &VoyagerConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    if !config.memory.persist_vectors {
        return Ok(Arc::new(InMemoryVectorIndex::new()));
    }

    let db = VoyagerDb::open_at(&config.memory.db_path)?;
    let index = SqliteVectorIndex::new(&db);
    let purged = index.purge_all()?;
    if purged > 0 {
        tracing::info!(purged, "Purged vectors from previous run");
    }
    Ok(Arc::new(index))
}

pub async fn run_server(config: VoyagerConfig) -> anyhow::Result<()> {
    let index = open_vector_index(&config)?;
    let llm = build_completion_service(&config.model, config.apis.http_timeout_secs)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let cleanup_every = Duration::from_secs(config.sessions.cleanup_interval_secs.max(1));

    let state: SharedState = Arc::new(AppState::new(
        config,
        Some(PathBuf::from(CONFIG_PATH)),
        ApiKeys::from_env(),
        index,
        llm,
    )?);

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_every);
        loop {
            interval.tick().await;
            sweeper.sessions.cleanup_expired().await;
        }
    });

    let app = api::router(state.clone());

    tracing::info!(%addr, model = %state.llm.read().await.model_name(), "Voyager server running");
    tracing::info!("   Sessions: /api/v1/sessions, /:id/chat, /:id/itinerary");
    tracing::info!("   Trips:    /api/v1/trips/overview, /api/v1/budget");
    tracing::info!("   NLP:      /api/v1/nlp/sentiment, /intent, /entities, /language");
    tracing::info!("   Config:   /api/v1/config (GET, PATCH), /api/v1/providers");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("voyager=info,voyager_core=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = VoyagerConfig::load().await;

    match args.command {
        None => run_server(config).await,
        Some(CliCommand::Serve { port, host }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            run_server(config).await
        }
        Some(CliCommand::Plan {
            destination,
            budget,
            interests,
            duration,
            itinerary,
        }) => cli::plan(&config, destination, budget, interests, duration, itinerary).await,
        Some(CliCommand::Budget {
            destination,
            duration,
        }) => cli::budget(&destination, duration),
        Some(CliCommand::Analyze { text }) => cli::analyze(&config, &text),
        Some(CliCommand::Init) => cli::init().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use voyager_core::llm::ScriptedCompletion;
    use voyager_core::memory::EmbedderKind;

    fn test_state(llm: ScriptedCompletion) -> SharedState {
        let mut config = VoyagerConfig::default();
        config.memory.max_history = 3;
        config.memory.embedder = EmbedderKind::Hashing;
        Arc::new(
            AppState::new(
                config,
                None,
                ApiKeys::default(),
                Arc::new(InMemoryVectorIndex::new()),
                Arc::new(llm),
            )
            .unwrap(),
        )
    }

    async fn send(state: &SharedState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = api::router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(state: &SharedState) -> String {
        let (status, body) = send(state, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state(ScriptedCompletion::replying("hi"));
        let (status, body) = send(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "scripted/test");
    }

    #[tokio::test]
    async fn test_chat_flow_and_history() {
        let state = test_state(ScriptedCompletion::replying("Pack an umbrella."));
        let id = new_session(&state).await;

        for message in ["Is it rainy in London?", "What should I pack?"] {
            let (status, body) = send(
                &state,
                "POST",
                &format!("/api/v1/sessions/{}/chat", id),
                Some(json!({ "message": message })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["exchange"]["response"], "Pack an umbrella.");
        }

        let (status, body) = send(&state, "GET", &format!("/api/v1/sessions/{}/history?n=1", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        let turns = body["turns"].as_array().unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0]["user_message"], "What should I pack?");
        assert_eq!(turns[0]["sequence"], 2);

        let (status, body) = send(
            &state,
            "POST",
            &format!("/api/v1/sessions/{}/context", id),
            Some(json!({ "query": "rain in London", "top_k": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["documents"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let state = test_state(ScriptedCompletion::replying("ok"));
        let id = new_session(&state).await;

        for i in 1..=5 {
            send(
                &state,
                "POST",
                &format!("/api/v1/sessions/{}/chat", id),
                Some(json!({ "message": format!("question {}", i) })),
            )
            .await;
        }

        let (_, body) = send(&state, "GET", &format!("/api/v1/sessions/{}/history?n=10", id), None).await;
        let turns = body["turns"].as_array().unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0]["user_message"], "question 3");
        assert_eq!(body["max_history"], 3);
    }

    #[tokio::test]
    async fn test_chat_model_failure_is_bad_gateway() {
        let state = test_state(ScriptedCompletion::failing());
        let id = new_session(&state).await;

        let (status, body) = send(
            &state,
            "POST",
            &format!("/api/v1/sessions/{}/chat", id),
            Some(json!({ "message": "Hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "provider");

        let (_, body) = send(&state, "GET", &format!("/api/v1/sessions/{}/history", id), None).await;
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_end_session() {
        let state = test_state(ScriptedCompletion::replying("ok"));
        let id = new_session(&state).await;

        let (status, _) = send(&state, "DELETE", &format!("/api/v1/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&state, "GET", &format!("/api/v1/sessions/{}/history", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "session_not_found");
    }

    #[tokio::test]
    async fn test_nlp_endpoints() {
        let state = test_state(ScriptedCompletion::replying("ok"));

        let (status, body) = send(&state, "POST", "/api/v1/nlp/sentiment", Some(json!({ "text": "I love this trip" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["sentiment"]["polarity"].as_f64().unwrap() > 0.0);

        let (status, body) = send(
            &state,
            "POST",
            "/api/v1/nlp/intent",
            Some(json!({ "text": "What's the budget for this trip?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let intents: Vec<&str> = body["analysis"]["detected_intents"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|i| i["intent"].as_str())
            .collect();
        assert!(intents.contains(&"budget_inquiry"));

        let (status, body) = send(&state, "POST", "/api/v1/nlp/entities", Some(json!({ "text": "  " }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "empty_input");
    }

    #[tokio::test]
    async fn test_budget_endpoint() {
        let state = test_state(ScriptedCompletion::replying("ok"));
        let (status, body) = send(&state, "GET", "/api/v1/budget?destination=Paris", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimate"]["total_estimated_budget"], 1450);
        assert_eq!(body["estimate"]["cost_breakdown"]["food"], 350);
        assert_eq!(body["shares"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_trip_validation() {
        let state = test_state(ScriptedCompletion::replying("ok"));
        let (status, body) = send(
            &state,
            "POST",
            "/api/v1/trips/overview",
            Some(json!({ "destination": "Paris", "budget": 50, "interests": ["Food"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "invalid_trip");
    }

    #[tokio::test]
    async fn test_itinerary_requires_trip_data() {
        let state = test_state(ScriptedCompletion::replying("Day 1"));
        let id = new_session(&state).await;

        let (status, body) = send(
            &state,
            "POST",
            &format!("/api/v1/sessions/{}/itinerary", id),
            Some(json!({ "destination": "Paris", "budget": 1500, "interests": ["Food"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "missing_trip_data");

        let (status, body) = send(&state, "GET", &format!("/api/v1/sessions/{}/itinerary/download", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "no_plan");
    }

    #[tokio::test]
    async fn test_config_patch_updates_new_sessions() {
        let state = test_state(ScriptedCompletion::replying("ok"));
        let (status, body) = send(
            &state,
            "PATCH",
            "/api/v1/config",
            Some(json!({ "max_history": 7, "top_k": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["config"]["memory"]["max_history"], 7);
        assert_eq!(body["config"]["memory"]["top_k"], 1);

        let id = new_session(&state).await;
        let (_, body) = send(&state, "GET", &format!("/api/v1/sessions/{}/history", id), None).await;
        assert_eq!(body["max_history"], 7);
    }

    #[tokio::test]
    async fn test_providers_and_openapi() {
        let state = test_state(ScriptedCompletion::replying("ok"));
        let (status, body) = send(&state, "GET", "/api/v1/providers", None).await;
        assert_eq!(status, StatusCode::OK);
        let providers = body["providers"].as_array().unwrap();
        assert_eq!(providers.len(), 7);
        assert_eq!(providers[0]["id"], "groq");
        assert_eq!(providers[0]["active"], true);

        let (status, body) = send(&state, "GET", "/api/v1/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/sessions/{id}/chat"].is_object());
    }
}
