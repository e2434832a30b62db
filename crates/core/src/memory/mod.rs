//! # Memory Module
//!
//! Semantic conversation memory for travel sessions.
//!
//! ## Architecture
//!
//! ```text
//!        ConversationMemory (bounded FIFO of turns)
//!           ↓                       ↓
//!       Embedder                VectorIndex
//!  (hashing | fastembed)   (SQLite | in-memory)
//! ```

pub mod conversation;
pub mod embedder;
pub mod error;
pub mod vector_index;

pub use conversation::{
    format_document, ConversationMemory, ConversationTurn, DEFAULT_MAX_HISTORY, DEFAULT_RECENT,
    DEFAULT_TOP_K,
};
pub use embedder::{build_embedder, Embedder, EmbedderKind, HashingEmbedder, EMBEDDING_DIM};
pub use error::MemoryError;
pub use vector_index::{
    InMemoryVectorIndex, SqliteVectorIndex, VectorIndex, VectorMatch, VectorRecord,
};
