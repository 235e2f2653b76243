//! Merging direct and expanded results
//!
//! Passages are identified by a fixed-length text prefix. Two different
//! passages sharing that prefix collapse into one; this is accepted.

use super::Candidate;
use std::collections::HashSet;

/// Dedup identity: the first `prefix_chars` characters
pub fn dedup_key(text: &str, prefix_chars: usize) -> &str {
    match text.char_indices().nth(prefix_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Direct results first in rank order, then the first `per_branch` results
/// of each expansion branch in branch order, skipping duplicates and
/// stopping once `cap` candidates are collected.
pub fn merge_candidates(
    direct: Vec<Candidate>,
    branches: Vec<Vec<Candidate>>,
    per_branch: usize,
    cap: usize,
    prefix_chars: usize,
) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let expanded = branches
        .into_iter()
        .flat_map(|branch| branch.into_iter().take(per_branch));

    for candidate in direct.into_iter().chain(expanded) {
        if merged.len() >= cap {
            break;
        }
        if seen.insert(dedup_key(&candidate.text, prefix_chars).to_string()) {
            merged.push(candidate);
        }
    }

    merged
}
