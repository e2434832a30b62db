//! Error types for conversation memory

use thiserror::Error;

/// Errors raised by the embedder, the vector index, or the conversation store
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Embedding model failed to load
    #[error("Model error: {0}")]
    Model(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index rejected or failed an operation
    #[error("Index error: {0}")]
    Index(String),

    /// Vector dimension disagrees with the collection
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Poisoned lock
    #[error("Lock error: {0}")]
    Lock(String),
}

impl MemoryError {
    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create an index error
    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// Create a lock error
    pub fn lock(msg: impl std::fmt::Display) -> Self {
        Self::Lock(msg.to_string())
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::Embedding(_) => "embedding",
            Self::Index(_) | Self::DimensionMismatch { .. } => "index",
            Self::Sqlite(_) => "sqlite",
            Self::Lock(_) => "lock",
        }
    }
}

/// Result alias for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;
