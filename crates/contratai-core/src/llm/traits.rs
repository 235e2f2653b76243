//! Capability trait definitions

use super::prompts::{PromptId, PromptVars};
use crate::error::Result;
use async_trait::async_trait;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Pairwise relevance scoring (cross-encoder style)
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Score each `(query, passage)` pair; one score per pair, same order
    async fn score_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<f64>>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Prompt-template driven text generation.
///
/// The returned text is expected, not guaranteed, to be a JSON record;
/// callers validate it.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: PromptId, vars: &PromptVars) -> Result<String>;
}
