//! # Travel Sessions
//!
//! Per-user state owned by a [`SessionManager`]: conversation memory and the
//! log of generated itineraries. Each session sits behind its own
//! `tokio::sync::Mutex`, so one session handles one interaction at a time.
//!
//! A session starts with an empty history and a freshly cleared vector
//! collection (`session-{id}`). It ends either through [`SessionManager::end`]
//! or once it has been idle longer than the configured TTL; both paths clear
//! the collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::{MemorySettings, SessionSettings};
use crate::memory::{ConversationMemory, Embedder, MemoryError, VectorIndex};
use crate::travel::{plan_memory_label, TravelPlan, TravelPlanDocument, TripOverview};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session expired: {0}")]
    Expired(String),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "session_not_found",
            SessionError::Expired(_) => "session_expired",
            SessionError::Memory(e) => e.kind(),
        }
    }
}

pub type SharedSession = Arc<Mutex<TravelSession>>;

/// One user's conversation and generated plans
pub struct TravelSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub memory: ConversationMemory,
    plans: Vec<TravelPlanDocument>,
}

impl TravelSession {
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn is_idle_for(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        if ttl.is_zero() {
            return false;
        }
        now.signed_duration_since(self.last_active)
            .to_std()
            .map(|idle| idle > ttl)
            .unwrap_or(false)
    }

    /// Remember a generated plan as a conversation turn and in the plan log
    pub fn record_plan(
        &mut self,
        overview: &TripOverview,
        plan: &TravelPlan,
    ) -> Result<TravelPlanDocument, MemoryError> {
        self.memory
            .add_conversation(&plan_memory_label(&plan.destination), &plan.plan)?;
        let document = TravelPlanDocument::new(overview, plan);
        self.plans.push(document.clone());
        Ok(document)
    }

    pub fn last_plan(&self) -> Option<&TravelPlanDocument> {
        self.plans.last()
    }

    pub fn plans(&self) -> &[TravelPlanDocument] {
        &self.plans
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            last_active: self.last_active,
            turns: self.memory.len(),
            plans: self.plans.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub turns: usize,
    pub plans: usize,
}

/// Limits applied to sessions created from now on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionLimits {
    pub max_history: usize,
    /// Zero disables idle expiry
    pub ttl: Duration,
}

impl SessionLimits {
    pub fn from_settings(memory: &MemorySettings, sessions: &SessionSettings) -> Self {
        Self {
            max_history: memory.max_history,
            ttl: Duration::from_secs(sessions.ttl_minutes.saturating_mul(60)),
        }
    }
}

/// Name of the vector collection owned by a session
pub fn collection_name(session_id: &str) -> String {
    format!("session-{}", session_id)
}

/// Registry of live sessions sharing one embedder and vector index
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SharedSession>>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    limits: RwLock<SessionLimits>,
}

impl SessionManager {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        limits: SessionLimits,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            embedder,
            index,
            limits: RwLock::new(limits),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub async fn limits(&self) -> SessionLimits {
        *self.limits.read().await
    }

    pub async fn set_limits(&self, limits: SessionLimits) {
        *self.limits.write().await = limits;
    }

    /// Start a session with an empty history
    pub async fn create(&self) -> Result<SharedSession, SessionError> {
        let id = Uuid::new_v4().to_string();
        let limits = self.limits().await;
        let memory = ConversationMemory::new(
            collection_name(&id),
            self.embedder.clone(),
            self.index.clone(),
            limits.max_history,
        )?;

        let now = Utc::now();
        let session = Arc::new(Mutex::new(TravelSession {
            id: id.clone(),
            created_at: now,
            last_active: now,
            memory,
            plans: Vec::new(),
        }));

        self.sessions.write().await.insert(id.clone(), session.clone());
        tracing::info!(session_id = %id, max_history = limits.max_history, "Session created");
        Ok(session)
    }

    /// Look up a live session and mark it active.
    ///
    /// An idle session past its TTL is torn down and reported as expired.
    pub async fn get(&self, id: &str) -> Result<SharedSession, SessionError> {
        let session = self
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let ttl = self.limits().await.ttl;
        let expired = {
            let mut guard = session.lock().await;
            if guard.is_idle_for(ttl, Utc::now()) {
                true
            } else {
                guard.touch();
                false
            }
        };

        if expired {
            return Err(self.expire(id).await);
        }
        Ok(session)
    }

    /// Tear down a session found idle. A concurrent request may have ended it first.
    async fn expire(&self, id: &str) -> SessionError {
        match self.end(id).await {
            Ok(_) | Err(SessionError::NotFound(_)) => SessionError::Expired(id.to_string()),
            Err(e) => e,
        }
    }

    /// Tear down a session, clearing its vectors. Returns the number of turns dropped.
    pub async fn end(&self, id: &str) -> Result<usize, SessionError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let mut guard = session.lock().await;
        let turns = guard.memory.len();
        guard.memory.clear()?;
        tracing::info!(session_id = %id, turns, "Session ended");
        Ok(turns)
    }

    /// Summaries of live sessions, oldest first
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions: Vec<SharedSession> = self.sessions.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(sessions.len());
        for session in sessions {
            summaries.push(session.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// End every session idle past the TTL. Returns the ids removed.
    pub async fn cleanup_expired(&self) -> Vec<String> {
        let ttl = self.limits().await.ttl;
        if ttl.is_zero() {
            return Vec::new();
        }

        let now = Utc::now();
        let sessions: Vec<(String, SharedSession)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect();

        let mut expired = Vec::new();
        for (id, session) in sessions {
            if session.lock().await.is_idle_for(ttl, now) {
                expired.push(id);
            }
        }

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            match self.end(&id).await {
                Ok(_) => removed.push(id),
                Err(SessionError::NotFound(_)) => {}
                Err(e) => {
                    tracing::warn!(session_id = %id, error = %e, "Failed to clean up session")
                }
            }
        }

        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "Expired sessions cleaned up");
        }
        removed
    }
}
