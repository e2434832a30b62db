//! # Vector Index
//!
//! Local store of `(id, vector, document)` records grouped into named
//! collections, queried by cosine distance. Ties keep insertion order.
//!
//! Two backends:
//! - [`SqliteVectorIndex`] - rows in `conversation_vectors`, embeddings as
//!   little-endian f32 BLOBs, brute-force ranking in process
//! - [`InMemoryVectorIndex`] - a map of vectors behind a lock

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use super::error::{MemoryError, Result};
use crate::state::db::VoyagerDb;

/// A record to store
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, document: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            embedding,
            document: document.into(),
        }
    }
}

/// A query hit. Smaller distance is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub document: String,
    pub distance: f32,
}

/// Nearest-neighbour store keyed by collection
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a record. Replacing keeps its original position.
    fn upsert(&self, collection: &str, record: VectorRecord) -> Result<()>;

    /// Remove a record, returning whether it existed
    fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Up to `k` nearest records, closest first
    fn query(&self, collection: &str, embedding: &[f32], k: usize) -> Result<Vec<VectorMatch>>;

    /// Number of records in a collection
    fn count(&self, collection: &str) -> Result<usize>;

    /// Record ids in insertion order
    fn ids(&self, collection: &str) -> Result<Vec<String>>;

    /// Drop every record of a collection, returning how many were removed
    fn clear(&self, collection: &str) -> Result<usize>;
}

/// Cosine similarity, 0.0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// `1 - cosine_similarity`, in [0, 2]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Rank candidates (already in insertion order) and keep the first `k`
fn rank<I>(candidates: I, query: &[f32], k: usize) -> Vec<VectorMatch>
where
    I: IntoIterator<Item = (String, String, Vec<f32>)>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<VectorMatch> = candidates
        .into_iter()
        .map(|(id, document, embedding)| VectorMatch {
            distance: cosine_distance(query, &embedding),
            id,
            document,
        })
        .collect();

    // Stable sort keeps insertion order among equal distances
    scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// SQLite-backed index sharing the VoyagerDb connection
pub struct SqliteVectorIndex {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVectorIndex {
    /// Create from shared VoyagerDb connection
    pub fn new(db: &VoyagerDb) -> Self {
        Self {
            conn: db.connection(),
        }
    }

    /// Remove every collection. Used at startup since sessions do not survive restarts.
    pub fn purge_all(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(MemoryError::lock)?;
        let removed = conn.execute("DELETE FROM conversation_vectors", [])?;
        if removed > 0 {
            tracing::info!(removed, "Purged stale conversation vectors");
        }
        Ok(removed)
    }

    /// Names of collections currently holding records
    pub fn collections(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().map_err(MemoryError::lock)?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT collection FROM conversation_vectors ORDER BY collection",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

impl VectorIndex for SqliteVectorIndex {
    fn upsert(&self, collection: &str, record: VectorRecord) -> Result<()> {
        let conn = self.conn.lock().map_err(MemoryError::lock)?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT dimension FROM conversation_vectors WHERE collection = ?1 AND id != ?2 LIMIT 1",
                params![collection, record.id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(expected) = existing {
            if expected as usize != record.embedding.len() {
                return Err(MemoryError::DimensionMismatch {
                    expected: expected as usize,
                    actual: record.embedding.len(),
                });
            }
        }

        conn.execute(
            r#"
            INSERT INTO conversation_vectors (collection, id, document, embedding, dimension, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(collection, id) DO UPDATE SET
                document = excluded.document,
                embedding = excluded.embedding,
                dimension = excluded.dimension
            "#,
            params![
                collection,
                record.id,
                record.document,
                encode_embedding(&record.embedding),
                record.embedding.len() as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tracing::debug!(collection, id = %record.id, "Upserted vector");
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let conn = self.conn.lock().map_err(MemoryError::lock)?;
        let affected = conn.execute(
            "DELETE FROM conversation_vectors WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(affected > 0)
    }

    fn query(&self, collection: &str, embedding: &[f32], k: usize) -> Result<Vec<VectorMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().map_err(MemoryError::lock)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, document, embedding
            FROM conversation_vectors
            WHERE collection = ?1
            ORDER BY seq ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![collection], |row| {
                let blob: Vec<u8> = row.get(2)?;
                Ok((row.get(0)?, row.get(1)?, decode_embedding(&blob)))
            })?
            .collect::<std::result::Result<Vec<(String, String, Vec<f32>)>, _>>()?;

        Ok(rank(rows, embedding, k))
    }

    fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.conn.lock().map_err(MemoryError::lock)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM conversation_vectors WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn ids(&self, collection: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().map_err(MemoryError::lock)?;
        let mut stmt = conn.prepare(
            "SELECT id FROM conversation_vectors WHERE collection = ?1 ORDER BY seq ASC",
        )?;
        let ids = stmt
            .query_map(params![collection], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn clear(&self, collection: &str) -> Result<usize> {
        let conn = self.conn.lock().map_err(MemoryError::lock)?;
        let removed = conn.execute(
            "DELETE FROM conversation_vectors WHERE collection = ?1",
            params![collection],
        )?;
        Ok(removed)
    }
}

/// In-process index, mostly for tests and ephemeral runs
#[derive(Default)]
pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, Vec<VectorRecord>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn upsert(&self, collection: &str, record: VectorRecord) -> Result<()> {
        let mut collections = self.collections.write().map_err(MemoryError::lock)?;
        let records = collections.entry(collection.to_string()).or_default();

        if let Some(other) = records.iter().find(|r| r.id != record.id) {
            if other.embedding.len() != record.embedding.len() {
                return Err(MemoryError::DimensionMismatch {
                    expected: other.embedding.len(),
                    actual: record.embedding.len(),
                });
            }
        }

        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut collections = self.collections.write().map_err(MemoryError::lock)?;
        let Some(records) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    fn query(&self, collection: &str, embedding: &[f32], k: usize) -> Result<Vec<VectorMatch>> {
        let collections = self.collections.read().map_err(MemoryError::lock)?;
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let candidates = records
            .iter()
            .map(|r| (r.id.clone(), r.document.clone(), r.embedding.clone()));
        Ok(rank(candidates, embedding, k))
    }

    fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().map_err(MemoryError::lock)?;
        Ok(collections.get(collection).map(Vec::len).unwrap_or(0))
    }

    fn ids(&self, collection: &str) -> Result<Vec<String>> {
        let collections = self.collections.read().map_err(MemoryError::lock)?;
        Ok(collections
            .get(collection)
            .map(|records| records.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default())
    }

    fn clear(&self, collection: &str) -> Result<usize> {
        let mut collections = self.collections.write().map_err(MemoryError::lock)?;
        Ok(collections.remove(collection).map(|r| r.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exercise(index: &dyn VectorIndex) {
        index
            .upsert("trip", VectorRecord::new("a", vec![1.0, 0.0, 0.0], "alpha"))
            .unwrap();
        index
            .upsert("trip", VectorRecord::new("b", vec![0.0, 1.0, 0.0], "beta"))
            .unwrap();
        index
            .upsert("trip", VectorRecord::new("c", vec![0.9, 0.1, 0.0], "gamma"))
            .unwrap();
        index
            .upsert("other", VectorRecord::new("z", vec![1.0, 0.0, 0.0], "zeta"))
            .unwrap();

        assert_eq!(index.count("trip").unwrap(), 3);
        assert_eq!(index.ids("trip").unwrap(), vec!["a", "b", "c"]);

        let hits = index.query("trip", &[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
        assert!(hits[0].distance <= hits[1].distance);

        // Replace keeps position
        index
            .upsert("trip", VectorRecord::new("a", vec![0.0, 0.0, 1.0], "alpha v2"))
            .unwrap();
        assert_eq!(index.ids("trip").unwrap(), vec!["a", "b", "c"]);
        let hits = index.query("trip", &[0.0, 0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].document, "alpha v2");

        assert!(index.delete("trip", "b").unwrap());
        assert!(!index.delete("trip", "b").unwrap());
        assert_eq!(index.ids("trip").unwrap(), vec!["a", "c"]);

        assert!(index.query("trip", &[1.0, 0.0, 0.0], 0).unwrap().is_empty());
        assert!(index.query("missing", &[1.0, 0.0, 0.0], 3).unwrap().is_empty());

        let err = index
            .upsert("trip", VectorRecord::new("d", vec![1.0, 0.0], "short"))
            .unwrap_err();
        assert!(matches!(err, MemoryError::DimensionMismatch { expected: 3, actual: 2 }));

        assert_eq!(index.clear("trip").unwrap(), 2);
        assert_eq!(index.count("trip").unwrap(), 0);
        assert_eq!(index.count("other").unwrap(), 1);
    }

    #[test]
    fn test_in_memory_index() {
        exercise(&InMemoryVectorIndex::new());
    }

    #[test]
    fn test_sqlite_index_with_voyager_db() {
        let path = ".voyager/test_vector_index.db";
        let _ = fs::remove_file(path);

        let db = VoyagerDb::open_at(path).unwrap();
        let index = SqliteVectorIndex::new(&db);
        exercise(&index);

        assert_eq!(index.collections().unwrap(), vec!["other"]);
        assert_eq!(index.purge_all().unwrap(), 1);
        assert!(index.collections().unwrap().is_empty());

        drop(index);
        drop(db);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = InMemoryVectorIndex::new();
        for id in ["first", "second", "third"] {
            index
                .upsert("c", VectorRecord::new(id, vec![0.5, 0.5], id))
                .unwrap();
        }
        let hits = index.query("c", &[1.0, 1.0], 3).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_embedding_blob_round_trip() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(decode_embedding(&encode_embedding(&v)), v);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
