//! # Embedders
//!
//! Text → fixed-length vector. The same input always yields the same vector.
//!
//! - `FastEmbedder` - `fastembed` AllMiniLM-L6-v2 (384-dim), the default.
//!   Behind the `local-embeddings` feature, which is on by default.
//! - [`HashingEmbedder`] - signed feature hashing over SHA-256 of tokens and
//!   bigrams. Used when the model cannot load, and in tests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::error::Result;
#[cfg(feature = "local-embeddings")]
use super::error::MemoryError;

/// Dimension of AllMiniLM-L6-v2, shared by the hashing embedder
pub const EMBEDDING_DIM: usize = 384;

/// Maps text to a dense vector
pub trait Embedder: Send + Sync {
    /// Identifier reported in logs
    fn name(&self) -> &str;

    /// Length of every vector produced
    fn dimension(&self) -> usize;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embedder selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    /// Deterministic feature hashing
    Hashing,
    /// Local sentence-transformer via fastembed
    #[default]
    Fastembed,
}

impl EmbedderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedderKind::Hashing => "hashing",
            EmbedderKind::Fastembed => "fastembed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" | "hash" | "stub" => Some(EmbedderKind::Hashing),
            "fastembed" | "minilm" | "all-minilm-l6-v2" => Some(EmbedderKind::Fastembed),
            _ => None,
        }
    }
}

/// Build the configured embedder, falling back to hashing when the model is unavailable
pub fn build_embedder(kind: EmbedderKind) -> Arc<dyn Embedder> {
    match kind {
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::default()),
        EmbedderKind::Fastembed => {
            #[cfg(feature = "local-embeddings")]
            {
                match FastEmbedder::try_new() {
                    Ok(embedder) => {
                        tracing::info!("AllMiniLM-L6-v2 embedder loaded");
                        return Arc::new(embedder);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Embedding model unavailable, falling back to hashing embedder");
                    }
                }
            }
            #[cfg(not(feature = "local-embeddings"))]
            tracing::warn!(
                "fastembed requested but the local-embeddings feature is disabled, using hashing embedder"
            );
            Arc::new(HashingEmbedder::default())
        }
    }
}

/// Signed feature-hashing embedder
///
/// Each lowercase token adds ±1.0 and each adjacent token pair adds ±0.5 to a
/// bucket picked from its SHA-256 digest. The result is L2-normalised, so texts
/// sharing vocabulary end up close under cosine distance.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        let mut vector = vec![0f32; self.dimension];

        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        normalize(&mut vector);
        Ok(vector)
    }
}

/// Lowercase alphanumeric tokens (apostrophes kept inside words)
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Scale to unit length. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// fastembed AllMiniLM-L6-v2
///
/// `TextEmbedding::embed` needs exclusive access, so the model sits behind a mutex.
#[cfg(feature = "local-embeddings")]
pub struct FastEmbedder {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "local-embeddings")]
impl FastEmbedder {
    pub fn try_new() -> Result<Self> {
        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(false),
        )
        .map_err(|e| MemoryError::model(e.to_string()))?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "local-embeddings")]
impl Embedder for FastEmbedder {
    fn name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut model = self.model.lock().map_err(MemoryError::lock)?;
        let mut vectors = model
            .embed(vec![text], None)
            .map_err(|e| MemoryError::embedding(e.to_string()))?;
        vectors
            .pop()
            .ok_or_else(|| MemoryError::embedding("model returned no vectors"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("User: hello\nAI: hi there").unwrap();
        let b = embedder.embed("User: hello\nAI: hi there").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_unit_length() {
        let embedder = HashingEmbedder::default();
        let v = embedder.embed("Paris museums and cafes").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        let v = embedder.embed("   ").unwrap();
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("hotel prices in Tokyo").unwrap();
        let related = embedder
            .embed("User: what are hotel prices in Tokyo like?\nAI: around 120 dollars")
            .unwrap();
        let unrelated = embedder
            .embed("User: best hiking boots\nAI: pick waterproof ones")
            .unwrap();
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("What's the budget, Rome?"),
            vec!["what's", "the", "budget", "rome"]
        );
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(EmbedderKind::from_str("fastembed"), Some(EmbedderKind::Fastembed));
        assert_eq!(EmbedderKind::from_str(" Hashing "), Some(EmbedderKind::Hashing));
        assert_eq!(EmbedderKind::from_str("bert"), None);
        assert_eq!(EmbedderKind::Fastembed.as_str(), "fastembed");
    }

    #[test]
    fn test_default_kind_is_fastembed() {
        assert_eq!(EmbedderKind::default(), EmbedderKind::Fastembed);
        let kind: EmbedderKind = serde_json::from_str("\"hashing\"").unwrap();
        assert_eq!(kind, EmbedderKind::Hashing);
    }

    #[cfg(feature = "local-embeddings")]
    #[test]
    #[ignore = "downloads the AllMiniLM-L6-v2 model"]
    fn test_fastembed_matches_meaning() {
        let embedder = FastEmbedder::try_new().unwrap();
        let query = embedder.embed("where to eat dinner").unwrap();
        let beach = embedder
            .embed("User: What should I pack for the beach?\nAI: Sunscreen and swimwear")
            .unwrap();
        let food = embedder
            .embed("User: Recommend restaurants in Rome\nAI: Try a trattoria in Trastevere")
            .unwrap();
        assert_eq!(query.len(), EMBEDDING_DIM);
        assert!(cosine(&query, &food) > cosine(&query, &beach));
    }

    #[cfg(not(feature = "local-embeddings"))]
    #[test]
    fn test_fastembed_falls_back_without_feature() {
        let embedder = build_embedder(EmbedderKind::Fastembed);
        assert_eq!(embedder.name(), "hashing");
    }
}
