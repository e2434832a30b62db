//! # Voyager Core
//!
//! Domain logic for the Voyager travel assistant: conversation memory,
//! text analysis, trip planning, and language-model access.
//!
//! ## Architecture
//!
//! - `memory/` - Bounded conversation history mirrored into a vector index
//! - `nlp/` - Sentiment, intent, entity and language helpers
//! - `travel/` - Weather, attractions, recommendations, budget, itineraries
//! - `llm/` - Completion clients (chat-completions and radkit)
//! - `session/` - Per-user sessions and their lifecycle
//! - `state/` - SQLite database and migrations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use voyager_core::memory::{build_embedder, EmbedderKind, InMemoryVectorIndex};
//! use voyager_core::session::{SessionLimits, SessionManager};
//!
//! let sessions = SessionManager::new(
//!     build_embedder(EmbedderKind::Hashing),
//!     Arc::new(InMemoryVectorIndex::new()),
//!     SessionLimits::from_settings(&config.memory, &config.sessions),
//! );
//! let session = sessions.create().await?;
//! ```

pub mod chat;
pub mod config;
pub mod llm;
pub mod memory;
pub mod models;
pub mod nlp;
pub mod session;
pub mod state;
pub mod travel;
