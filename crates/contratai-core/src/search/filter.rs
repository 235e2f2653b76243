//! Narrowing retrieval to the statutes a question is about

use crate::db::{SourceCount, SourceFilter};
use crate::llm::json::{parse_object, string_list};
use crate::llm::{Generator, PromptId, PromptVars};
use std::path::Path;

/// Ask the model which indexed law files are relevant. Returns `None` (no
/// restriction) when the answer cannot be read or names nothing we index.
pub async fn select_sources(
    generator: &dyn Generator,
    question: &str,
    history: &str,
    available: &[SourceCount],
) -> Option<SourceFilter> {
    if available.is_empty() {
        return None;
    }

    let listing = available
        .iter()
        .map(|s| format!("- {}", s.source))
        .collect::<Vec<_>>()
        .join("\n");

    let vars = PromptVars::new()
        .with("sources", listing)
        .with("history", history)
        .with("question", question);

    let output = match generator.generate(PromptId::LawFilter, &vars).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Law filter generation failed, searching all sources: {}", e);
            return None;
        }
    };
    tracing::debug!("Law filter output: {}", output);

    let Some(map) = parse_object(&output) else {
        tracing::warn!("Law filter output is not a JSON object, searching all sources");
        return None;
    };

    let requested = string_list(&map, &["sources", "laws", "leis"]);
    let names: Vec<&str> = available.iter().map(|s| s.source.as_str()).collect();
    let matched = match_sources(&requested, &names);

    if matched.is_empty() {
        None
    } else {
        tracing::info!("Searching in: {}", matched.join(", "));
        Some(SourceFilter::new(matched))
    }
}

/// Resolve requested names against the indexed sources. A request matches
/// an indexed source by full name, by file name, or by file stem
/// (case-insensitive). Unknown names are dropped; order follows `requested`.
pub fn match_sources(requested: &[String], available: &[&str]) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();

    for name in requested {
        let wanted_name = file_name(name);
        let wanted_stem = file_stem(name);

        let hit = available.iter().find(|candidate| {
            **candidate == name.as_str()
                || file_name(candidate) == wanted_name
                || file_stem(candidate) == wanted_stem
        });

        if let Some(hit) = hit {
            if !matched.iter().any(|m| m == hit) {
                matched.push(hit.to_string());
            }
        }
    }

    matched
}

fn file_name(name: &str) -> String {
    Path::new(name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn file_stem(name: &str) -> String {
    Path::new(name.trim())
        .file_stem()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
