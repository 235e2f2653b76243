//! JSON output formatter

use contratai_core::{IndexHit, TurnOutcome};
use serde::Serialize;

pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()) + "\n"
}

pub fn format_turn(outcome: &TurnOutcome) -> String {
    // One object per line so a chat transcript stays line-delimited
    serde_json::to_string(outcome).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

pub fn format_passages(hits: &[IndexHit]) -> String {
    let output: Vec<serde_json::Value> = hits
        .iter()
        .map(|h| {
            serde_json::json!({
                "id": h.id,
                "source": h.source,
                "chunk_index": h.chunk_index,
                "text": h.text,
            })
        })
        .collect();
    to_pretty(&output)
}
