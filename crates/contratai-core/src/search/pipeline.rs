//! End-to-end legal retrieval: filter, retrieve, expand, merge, rerank

use super::{
    expand_query, merge_candidates, rerank, select_sources, Candidate, CandidateRetriever,
};
use crate::config::RetrievalConfig;
use crate::db::VectorIndex;
use crate::error::Result;
use crate::index::CorpusBootstrap;
use crate::llm::{Embedder, Generator, PromptId, PromptVars, RelevanceScorer};
use serde::Serialize;
use std::sync::Arc;

/// Passages selected for grounding an answer
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievedContext {
    /// Sources the search was restricted to; empty means the whole corpus
    pub sources: Vec<String>,
    pub paraphrases: Vec<String>,
    /// Size of the merged set before reranking
    pub merged: usize,
    /// Reranked passages, best first
    pub passages: Vec<Candidate>,
}

impl RetrievedContext {
    /// Passages joined by blank lines, in rerank order
    pub fn context(&self) -> String {
        self.passages
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub struct RetrievalPipeline {
    generator: Arc<dyn Generator>,
    embedder: Arc<dyn Embedder>,
    scorer: Arc<dyn RelevanceScorer>,
    index: Arc<dyn VectorIndex>,
    bootstrap: Arc<CorpusBootstrap>,
    config: RetrievalConfig,
}

impl RetrievalPipeline {
    pub fn new(
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
        scorer: Arc<dyn RelevanceScorer>,
        index: Arc<dyn VectorIndex>,
        bootstrap: Arc<CorpusBootstrap>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            generator,
            embedder,
            scorer,
            index,
            bootstrap,
            config,
        }
    }

    /// Select the context passages for `question`. Bootstraps the index on
    /// first use; that is the only failure that is not degraded.
    pub async fn retrieve(&self, question: &str, history: &str) -> Result<RetrievedContext> {
        self.bootstrap
            .ensure(self.index.as_ref(), self.embedder.as_ref())
            .await?;

        let filter = if self.config.source_filter {
            let available = self.index.sources()?;
            select_sources(self.generator.as_ref(), question, history, &available).await
        } else {
            None
        };
        if filter.is_none() {
            tracing::info!("Searching the whole law corpus");
        }

        let retriever = CandidateRetriever::new(self.embedder.clone(), self.index.clone());
        let direct = retriever
            .retrieve(question, self.config.direct_top_k, filter.as_ref())
            .await?;

        let paraphrases =
            expand_query(self.generator.as_ref(), question, self.config.paraphrase_count).await;
        let branches = retriever
            .retrieve_many(&paraphrases, self.config.expansion_top_k)
            .await?;

        let merged = merge_candidates(
            direct,
            branches,
            self.config.expansion_per_branch,
            self.config.merge_cap,
            self.config.dedup_prefix_chars,
        );
        let merged_count = merged.len();
        tracing::info!("Found {} relevant passages", merged_count);

        let passages = rerank(
            self.scorer.as_ref(),
            question,
            merged,
            self.config.rerank_top_k,
        )
        .await?;

        Ok(RetrievedContext {
            sources: filter.map(|f| f.names()).unwrap_or_default(),
            paraphrases,
            merged: merged_count,
            passages,
        })
    }

    /// Retrieve context and generate a grounded answer with `retrieve_law`.
    /// Returns the raw generation output.
    pub async fn answer(&self, question: &str, history: &str) -> Result<(RetrievedContext, String)> {
        let retrieved = self.retrieve(question, history).await?;

        let vars = PromptVars::new()
            .with("context", retrieved.context())
            .with("history", history)
            .with("question", question);
        let output = self.generator.generate(PromptId::RetrieveLaw, &vars).await?;
        tracing::debug!("Retrieve law output: {}", output);

        Ok((retrieved, output))
    }
}
