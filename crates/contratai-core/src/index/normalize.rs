//! Cleanup of raw statute text before chunking
//!
//! Text copied from official sources carries Windows line endings, ragged
//! indentation and articles glued to the previous sentence. Normalizing it
//! lets the `"\nArt. "` separator find every article.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INLINE_ARTICLE: Regex = Regex::new(r"([^\n])Art\.").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r" +").unwrap();
    static ref MULTI_NEWLINE: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Normalize statute text: unix newlines, trimmed lines, one article per
/// line, single spaces, at most one blank line in a row.
pub fn normalize_law_text(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let text = content.replace("\r\n", "\n");

    let text = text
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    let text = INLINE_ARTICLE.replace_all(&text, "$1\nArt.");
    let text = text.replace('\t', " ");
    let text = MULTI_SPACE.replace_all(&text, " ");
    let text = MULTI_NEWLINE.replace_all(&text, "\n\n");

    text.trim().to_string()
}
