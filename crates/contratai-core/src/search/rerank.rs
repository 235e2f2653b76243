//! Pairwise relevance reranking

use super::Candidate;
use crate::error::{ContratAiError, Result};
use crate::llm::RelevanceScorer;

/// Score every `(question, passage)` pair, stable-sort by score descending
/// and keep the best `top_k`. An empty input skips the scorer entirely.
pub async fn rerank(
    scorer: &dyn RelevanceScorer,
    question: &str,
    candidates: Vec<Candidate>,
    top_k: usize,
) -> Result<Vec<Candidate>> {
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let pairs: Vec<(String, String)> = candidates
        .iter()
        .map(|c| (question.to_string(), c.text.clone()))
        .collect();

    let scores = scorer.score_pairs(&pairs).await?;
    if scores.len() != candidates.len() {
        return Err(ContratAiError::Llm(format!(
            "Relevance scorer returned {} scores for {} passages",
            scores.len(),
            candidates.len()
        )));
    }

    let mut scored: Vec<Candidate> = candidates
        .into_iter()
        .zip(scores)
        .map(|(mut c, score)| {
            c.score = score;
            c
        })
        .collect();

    // sort_by is stable: equal scores keep merge order
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);

    tracing::debug!("Reranked to {} passages", scored.len());
    Ok(scored)
}
