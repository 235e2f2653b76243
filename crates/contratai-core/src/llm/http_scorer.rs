//! LLM-judged pairwise relevance scoring over HTTP

use super::json::parse_object;
use super::{ChatMessage, LLMClient, RelevanceScorer};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Pairs scored per request, to keep prompts within the model's context
const PAIRS_PER_REQUEST: usize = 8;

/// Passage characters shown to the judge
const PASSAGE_PREVIEW_CHARS: usize = 600;

/// Neutral score used when the judge's output cannot be read
const FALLBACK_SCORE: f64 = 0.5;

/// Relevance scorer that asks a chat model to grade each passage
pub struct HttpRelevanceScorer {
    client: Arc<dyn LLMClient>,
}

impl HttpRelevanceScorer {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RelevanceScorer for HttpRelevanceScorer {
    async fn score_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<f64>> {
        let mut scores = Vec::with_capacity(pairs.len());

        for batch in pairs.chunks(PAIRS_PER_REQUEST) {
            let messages = vec![
                ChatMessage::system(
                    "Score passage relevance to the query. Output ONLY JSON: {\"scores\": [0.0-1.0, ...]} with one score per passage, in order.",
                ),
                ChatMessage::user(build_scoring_prompt(batch)),
            ];

            let response = self.client.chat_completion(messages).await?;
            scores.extend(parse_scoring_response(&response, batch.len()));
        }

        Ok(scores)
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

fn build_scoring_prompt(pairs: &[(String, String)]) -> String {
    let mut prompt = String::new();

    for (idx, (query, passage)) in pairs.iter().enumerate() {
        let preview: String = passage.chars().take(PASSAGE_PREVIEW_CHARS).collect();
        prompt.push_str(&format!("[{}] Q: \"{}\"\nP: {}\n\n", idx, query, preview));
    }

    prompt.push_str("Score 0-1 JSON:\n{\"scores\":[0.0,...]}\n");
    prompt
}

fn parse_scoring_response(response: &str, expected: usize) -> Vec<f64> {
    let Some(parsed) = parse_object(response) else {
        tracing::warn!("Failed to parse scoring JSON, using fallback scores");
        tracing::debug!("Raw LLM response: {}", response);
        return vec![FALLBACK_SCORE; expected];
    };

    match parsed.get("scores").and_then(|v| v.as_array()) {
        Some(arr) => (0..expected)
            .map(|idx| {
                arr.get(idx)
                    .and_then(|v| v.as_f64())
                    .unwrap_or(FALLBACK_SCORE)
            })
            .collect(),
        None => vec![FALLBACK_SCORE; expected],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scores_by_index() {
        let scores = parse_scoring_response("```json\n{\"scores\": [0.9, 0.1]}\n```", 3);
        assert_eq!(scores, vec![0.9, 0.1, FALLBACK_SCORE]);
    }

    #[test]
    fn test_unparseable_response_uses_fallback() {
        assert_eq!(parse_scoring_response("no idea", 2), vec![FALLBACK_SCORE; 2]);
        assert_eq!(parse_scoring_response("{\"other\": 1}", 1), vec![FALLBACK_SCORE]);
    }

    #[test]
    fn test_prompt_truncates_passages() {
        let long = "x".repeat(PASSAGE_PREVIEW_CHARS + 50);
        let prompt = build_scoring_prompt(&[("q".to_string(), long)]);
        assert!(prompt.contains("[0] Q: \"q\""));
        assert!(!prompt.contains(&"x".repeat(PASSAGE_PREVIEW_CHARS + 1)));
    }
}
