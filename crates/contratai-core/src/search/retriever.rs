//! Nearest-neighbour candidate retrieval

use super::Candidate;
use crate::db::{SourceFilter, VectorIndex};
use crate::error::Result;
use crate::llm::Embedder;
use futures::future::join_all;
use std::sync::Arc;

/// Embeds queries and fetches their nearest passages
#[derive(Clone)]
pub struct CandidateRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl CandidateRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Top `top_k` passages for `query`, nearest first
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&SourceFilter>,
    ) -> Result<Vec<Candidate>> {
        let embedding = self.embedder.embed(query).await?;
        let hits = self.index.query(&embedding, top_k, filter)?;
        Ok(hits.into_iter().map(Candidate::from).collect())
    }

    /// One result list per query, in the order of `queries`. The branches
    /// run concurrently.
    pub async fn retrieve_many(
        &self,
        queries: &[String],
        top_k: usize,
    ) -> Result<Vec<Vec<Candidate>>> {
        let branches = queries.iter().map(|q| self.retrieve(q, top_k, None));
        join_all(branches).await.into_iter().collect()
    }
}
