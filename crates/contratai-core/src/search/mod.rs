//! Retrieval pipeline
//!
//! Provides:
//! - Source filtering of the law corpus by the generation capability
//! - Query expansion into paraphrases
//! - Direct and per-paraphrase nearest-neighbour retrieval
//! - Prefix-deduplicated merging, pairwise reranking and context assembly

mod expander;
mod filter;
mod merge;
mod pipeline;
mod rerank;
mod retriever;

pub use expander::expand_query;
pub use filter::{match_sources, select_sources};
pub use merge::{dedup_key, merge_candidates};
pub use pipeline::{RetrievalPipeline, RetrievedContext};
pub use rerank::rerank;
pub use retriever::CandidateRetriever;

use crate::db::IndexHit;
use serde::Serialize;

/// Passage considered for the answer context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub text: String,
    /// Similarity (1 - distance) until reranked, relevance afterwards
    pub score: f64,
    pub source: String,
    pub chunk_index: usize,
}

impl From<IndexHit> for Candidate {
    fn from(hit: IndexHit) -> Self {
        Self {
            text: hit.text,
            score: 1.0 - hit.distance as f64,
            source: hit.source,
            chunk_index: hit.chunk_index,
        }
    }
}
