//! Vector storage operations
//!
//! Embeddings are stored as little-endian f32 BLOBs and ranked by cosine
//! distance computed in Rust.

use super::Database;
use crate::error::Result;
use chrono::Utc;
use rusqlite::params;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Collection holding the law corpus
pub const LAWS_COLLECTION: &str = "laws";
/// Collection holding contract template descriptors
pub const CONTRACTS_COLLECTION: &str = "contracts";

/// Passage to store
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub source: String,
    pub chunk_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Nearest-neighbour hit; lower distance is closer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHit {
    pub id: String,
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
    pub distance: f32,
}

/// Per-source passage count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub chunks: usize,
}

/// Restricts a query to a set of source names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilter {
    sources: HashSet<String>,
}

impl SourceFilter {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, source: &str) -> bool {
        self.sources.contains(source)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Allowed names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.iter().cloned().collect();
        names.sort();
        names
    }
}

/// Nearest-neighbour store over embedded passages
pub trait VectorIndex: Send + Sync {
    /// Up to `top_k` hits ordered by ascending distance
    fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&SourceFilter>,
    ) -> Result<Vec<IndexHit>>;

    /// Insert or replace an entry by id
    fn upsert(&self, entry: IndexEntry) -> Result<()>;

    fn count(&self) -> Result<usize>;

    /// Indexed source names with their passage counts, sorted by name
    fn sources(&self) -> Result<Vec<SourceCount>>;

    /// First `limit` passages in (source, chunk_index) order; distance is 0
    fn peek(&self, limit: usize) -> Result<Vec<IndexHit>>;

    /// Passage stored under `id`, if any
    fn get(&self, id: &str) -> Result<Option<IndexHit>>;

    /// First `limit` passages of one source in chunk order
    fn by_source(&self, source: &str, limit: usize) -> Result<Vec<IndexHit>>;

    /// Remove every passage; returns how many were deleted
    fn clear(&self) -> Result<usize>;
}

/// One named collection inside the shared database
pub struct SqliteVectorIndex {
    db: Arc<Database>,
    collection: String,
}

impl SqliteVectorIndex {
    pub fn new(db: Arc<Database>, collection: impl Into<String>) -> Self {
        Self {
            db,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

fn row_to_hit(row: &rusqlite::Row) -> rusqlite::Result<IndexHit> {
    Ok(IndexHit {
        id: row.get(0)?,
        text: row.get(1)?,
        source: row.get(2)?,
        chunk_index: row.get::<_, i64>(3)? as usize,
        distance: 0.0,
    })
}

impl VectorIndex for SqliteVectorIndex {
    fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&SourceFilter>,
    ) -> Result<Vec<IndexHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.db.conn()?;

        // Score every embedding first, then load text only for the winners.
        let mut scored: Vec<(i64, String, f32)> = {
            let mut stmt = conn.prepare(
                "SELECT rowid, source, embedding FROM passages WHERE collection = ?1",
            )?;
            let rows = stmt
                .query_map(params![self.collection], |row| {
                    let bytes: Vec<u8> = row.get(2)?;
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        bytes_to_embedding(&bytes),
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .filter(|(_, source, _)| filter.map_or(true, |f| f.allows(source)))
                .map(|(rowid, source, stored)| {
                    (rowid, source, 1.0 - cosine_similarity(embedding, &stored))
                })
                .collect()
        };

        scored.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let mut stmt =
            conn.prepare("SELECT id, text, chunk_index FROM passages WHERE rowid = ?1")?;
        let mut hits = Vec::with_capacity(scored.len());
        for (rowid, source, distance) in scored {
            let (id, text, chunk_index) = stmt.query_row(params![rowid], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;
            hits.push(IndexHit {
                id,
                text,
                source,
                chunk_index: chunk_index as usize,
                distance,
            });
        }

        Ok(hits)
    }

    fn upsert(&self, entry: IndexEntry) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.db.conn()?.execute(
            "INSERT OR REPLACE INTO passages
             (collection, id, source, chunk_index, text, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.collection,
                entry.id,
                entry.source,
                entry.chunk_index as i64,
                entry.text,
                embedding_to_bytes(&entry.embedding),
                now
            ],
        )?;
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.db.conn()?.query_row(
            "SELECT COUNT(*) FROM passages WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn sources(&self) -> Result<Vec<SourceCount>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT source, COUNT(*) FROM passages WHERE collection = ?1
             GROUP BY source ORDER BY source",
        )?;
        let sources = stmt
            .query_map(params![self.collection], |row| {
                Ok(SourceCount {
                    source: row.get(0)?,
                    chunks: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn peek(&self, limit: usize) -> Result<Vec<IndexHit>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, text, source, chunk_index FROM passages WHERE collection = ?1
             ORDER BY source, chunk_index LIMIT ?2",
        )?;
        let hits = stmt
            .query_map(params![self.collection, limit as i64], row_to_hit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(hits)
    }

    fn get(&self, id: &str) -> Result<Option<IndexHit>> {
        let conn = self.db.conn()?;
        let result = conn.query_row(
            "SELECT id, text, source, chunk_index FROM passages
             WHERE collection = ?1 AND id = ?2",
            params![self.collection, id],
            row_to_hit,
        );
        match result {
            Ok(hit) => Ok(Some(hit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn by_source(&self, source: &str, limit: usize) -> Result<Vec<IndexHit>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, text, source, chunk_index FROM passages
             WHERE collection = ?1 AND source = ?2
             ORDER BY chunk_index LIMIT ?3",
        )?;
        let hits = stmt
            .query_map(params![self.collection, source, limit as i64], row_to_hit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(hits)
    }

    fn clear(&self) -> Result<usize> {
        let rows = self.db.conn()?.execute(
            "DELETE FROM passages WHERE collection = ?1",
            params![self.collection],
        )?;
        Ok(rows)
    }
}

/// Convert f32 embedding to bytes
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity; 0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(collection: &str) -> (Arc<Database>, SqliteVectorIndex) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.initialize().unwrap();
        let index = SqliteVectorIndex::new(db.clone(), collection);
        (db, index)
    }

    fn entry(id: &str, source: &str, chunk_index: usize, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            source: source.to_string(),
            chunk_index,
            text: format!("texto {}", id),
            embedding,
        }
    }

    #[test]
    fn test_embedding_roundtrip() {
        let original = vec![1.0f32, 2.0, 3.0, -1.5];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&original)), original);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_query_orders_by_distance() {
        let (_db, index) = index(LAWS_COLLECTION);
        index.upsert(entry("a", "cc.txt", 0, vec![1.0, 0.0])).unwrap();
        index.upsert(entry("b", "cc.txt", 1, vec![0.7, 0.7])).unwrap();
        index.upsert(entry("c", "cdc.txt", 0, vec![0.0, 1.0])).unwrap();

        let hits = index.query(&[1.0, 0.0], 2, None).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(hits[0].distance <= hits[1].distance);
        assert_eq!(hits[0].text, "texto a");
    }

    #[test]
    fn test_query_respects_source_filter() {
        let (_db, index) = index(LAWS_COLLECTION);
        index.upsert(entry("a", "cc.txt", 0, vec![1.0, 0.0])).unwrap();
        index.upsert(entry("c", "cdc.txt", 0, vec![0.0, 1.0])).unwrap();

        let filter = SourceFilter::new(["cdc.txt"]);
        let hits = index.query(&[1.0, 0.0], 10, Some(&filter)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "cdc.txt");
    }

    #[test]
    fn test_upsert_replaces_and_collections_are_isolated() {
        let (db, laws) = index(LAWS_COLLECTION);
        let contracts = SqliteVectorIndex::new(db, CONTRACTS_COLLECTION);

        laws.upsert(entry("law_chunk_0", "cc.txt", 0, vec![1.0])).unwrap();
        laws.upsert(entry("law_chunk_0", "cc.txt", 0, vec![0.5])).unwrap();
        contracts.upsert(entry("locacao", "locacao", 0, vec![1.0])).unwrap();

        assert_eq!(laws.count().unwrap(), 1);
        assert_eq!(contracts.count().unwrap(), 1);

        assert_eq!(laws.clear().unwrap(), 1);
        assert_eq!(laws.count().unwrap(), 0);
        assert_eq!(contracts.count().unwrap(), 1);
    }

    #[test]
    fn test_sources_and_peek() {
        let (_db, index) = index(LAWS_COLLECTION);
        index.upsert(entry("x1", "cdc.txt", 1, vec![1.0])).unwrap();
        index.upsert(entry("x0", "cdc.txt", 0, vec![1.0])).unwrap();
        index.upsert(entry("y0", "cc.txt", 0, vec![1.0])).unwrap();

        let sources = index.sources().unwrap();
        assert_eq!(
            sources,
            vec![
                SourceCount { source: "cc.txt".into(), chunks: 1 },
                SourceCount { source: "cdc.txt".into(), chunks: 2 },
            ]
        );

        let first: Vec<String> = index.peek(2).unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(first, vec!["y0", "x0"]);
    }

    #[test]
    fn test_lookup_by_id_and_source() {
        let (db, index) = index(LAWS_COLLECTION);
        let contracts = SqliteVectorIndex::new(db, CONTRACTS_COLLECTION);
        index.upsert(entry("x1", "cdc.txt", 1, vec![1.0])).unwrap();
        index.upsert(entry("x0", "cdc.txt", 0, vec![1.0])).unwrap();
        index.upsert(entry("y0", "cc.txt", 0, vec![1.0])).unwrap();
        contracts.upsert(entry("x9", "cdc.txt", 0, vec![1.0])).unwrap();

        let hit = index.get("x1").unwrap().unwrap();
        assert_eq!(hit.source, "cdc.txt");
        assert_eq!(hit.chunk_index, 1);
        assert_eq!(hit.text, "texto x1");
        assert!(index.get("nada").unwrap().is_none());
        assert!(index.get("x9").unwrap().is_none());

        let ids: Vec<String> = index
            .by_source("cdc.txt", 10)
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["x0", "x1"]);
        assert_eq!(index.by_source("cdc.txt", 1).unwrap().len(), 1);
        assert!(index.by_source("lei.txt", 10).unwrap().is_empty());
    }
}
