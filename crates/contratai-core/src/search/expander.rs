//! Query expansion into paraphrases

use crate::llm::json::{parse_object, string_list};
use crate::llm::{Generator, PromptId, PromptVars};

/// Ask for `count` paraphrases of `question`. Unreadable output yields an
/// empty list; extra paraphrases are dropped.
pub async fn expand_query(generator: &dyn Generator, question: &str, count: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let vars = PromptVars::new()
        .with("count", count.to_string())
        .with("question", question);

    let output = match generator.generate(PromptId::ExpandQuery, &vars).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Query expansion failed: {}", e);
            return Vec::new();
        }
    };
    tracing::debug!("Expansion output: {}", output);

    let Some(map) = parse_object(&output) else {
        tracing::warn!("Query expansion output is not a JSON object");
        return Vec::new();
    };

    let mut variations = string_list(&map, &["variations", "variantes"]);
    variations.truncate(count);
    variations
}
