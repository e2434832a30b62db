//! # Conversation Memory
//!
//! Bounded, ordered history of chat turns kept in lockstep with a vector
//! index collection. Each turn is embedded as `"User: {msg}\nAI: {response}"`
//! and the oldest turn is evicted from both stores once `max_history` is
//! exceeded.
//!
//! The index is always mutated before the in-memory history. If eviction
//! fails after the new vector was written, that vector is deleted again and
//! the history is left untouched, so callers never see the two stores
//! disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

use super::embedder::Embedder;
use super::error::Result;
use super::vector_index::{VectorIndex, VectorRecord};

/// Default bound on stored turns
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Default number of context documents retrieved per query
pub const DEFAULT_TOP_K: usize = 3;

/// Default number of turns shown as recent history
pub const DEFAULT_RECENT: usize = 5;

/// One exchange between the user and the assistant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub id: String,
    pub user_message: String,
    pub ai_response: String,
    /// Monotonic per-memory counter, starting at 1
    pub sequence: u64,
    /// Wall-clock time of the add, display only
    pub recorded_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Text stored in the vector index for this turn
    pub fn document(&self) -> String {
        format_document(&self.user_message, &self.ai_response)
    }

    /// User message cut to `max_chars` characters, with "..." when shortened
    pub fn preview(&self, max_chars: usize) -> String {
        if self.user_message.chars().count() <= max_chars {
            self.user_message.clone()
        } else {
            let head: String = self.user_message.chars().take(max_chars).collect();
            format!("{}...", head)
        }
    }
}

/// Embedded document text for a turn
pub fn format_document(user_message: &str, ai_response: &str) -> String {
    format!("User: {}\nAI: {}", user_message, ai_response)
}

/// Session conversation store backed by an embedder and a vector index
pub struct ConversationMemory {
    collection: String,
    max_history: usize,
    history: VecDeque<ConversationTurn>,
    next_sequence: u64,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl ConversationMemory {
    /// Create an empty memory owning `collection` inside `index`.
    ///
    /// Any records already in the collection are removed so both stores start empty.
    pub fn new(
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        max_history: usize,
    ) -> Result<Self> {
        let collection = collection.into();
        let stale = index.clear(&collection)?;
        if stale > 0 {
            tracing::debug!(collection = %collection, stale, "Cleared stale vectors");
        }

        Ok(Self {
            collection,
            max_history: max_history.max(1),
            history: VecDeque::new(),
            next_sequence: 1,
            embedder,
            index,
        })
    }

    /// Record a turn, returning its id.
    ///
    /// Embedding and index failures propagate and leave the memory unchanged.
    pub fn add_conversation(&mut self, user_message: &str, ai_response: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let document = format_document(user_message, ai_response);
        let embedding = self.embedder.embed(&document)?;

        self.index.upsert(
            &self.collection,
            VectorRecord::new(id.clone(), embedding, document),
        )?;

        let evicted = if self.history.len() >= self.max_history {
            self.history.front().map(|turn| turn.id.clone())
        } else {
            None
        };

        if let Some(oldest) = &evicted {
            match self.index.delete(&self.collection, oldest) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(collection = %self.collection, id = %oldest, "Evicted turn had no vector")
                }
                Err(e) => {
                    tracing::warn!(collection = %self.collection, error = %e, "Eviction failed, rolling back new vector");
                    if let Err(undo) = self.index.delete(&self.collection, &id) {
                        tracing::warn!(collection = %self.collection, id = %id, error = %undo, "Rollback of new vector failed");
                    }
                    return Err(e);
                }
            }
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.history.push_back(ConversationTurn {
            id: id.clone(),
            user_message: user_message.to_string(),
            ai_response: ai_response.to_string(),
            sequence,
            recorded_at: Utc::now(),
        });
        if evicted.is_some() {
            self.history.pop_front();
        }

        tracing::debug!(collection = %self.collection, id = %id, sequence, len = self.history.len(), "Stored conversation turn");
        Ok(id)
    }

    /// Documents of the `top_k` stored turns closest to `query`, closest first
    pub fn retrieve_relevant_context(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        if top_k == 0 || self.history.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query)?;
        let matches = self.index.query(&self.collection, &embedding, top_k)?;
        Ok(matches.into_iter().map(|m| m.document).collect())
    }

    /// The last `min(n, len)` turns, oldest first
    pub fn get_recent_history(&self, n: usize) -> Vec<ConversationTurn> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ids of stored turns, oldest first
    pub fn ids(&self) -> Vec<String> {
        self.history.iter().map(|t| t.id.clone()).collect()
    }

    /// Remove every turn from both stores
    pub fn clear(&mut self) -> Result<()> {
        let removed = self.index.clear(&self.collection)?;
        self.history.clear();
        tracing::debug!(collection = %self.collection, removed, "Cleared conversation memory");
        Ok(())
    }
}
