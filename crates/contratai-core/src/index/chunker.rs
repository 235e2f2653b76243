//! Recursive separator-based chunking for legal documents
//!
//! Pieces are carved out of the source as byte spans, so every chunk is an
//! exact slice of its source. Consecutive chunks overlap by whole trailing
//! pieces of the previous chunk.

use std::collections::VecDeque;
use std::ops::Range;

/// Chunking configuration
pub const CHUNK_SIZE_CHARS: usize = 1200;
pub const CHUNK_OVERLAP_CHARS: usize = 200;

/// Separator hierarchy tuned for Brazilian statutes, most significant first
pub fn default_legal_separators() -> Vec<String> {
    [
        "\n\n",
        "\nArt. ",
        "\nArtigo. ",
        "\nTÍTULO ",
        "\nCAPÍTULO ",
        "\nSeção ",
        "\n§ ",
        "\nParágrafo único",
        "\nI - ",
        "\nII - ",
        "\nIII - ",
        "\n",
        ". ",
        " ",
        "",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Document chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Identifier of the source document (usually its file name)
    pub source: String,
    /// Position of this chunk within its source
    pub index: usize,
    /// Byte offset of the chunk start in the source
    pub start: usize,
    /// Byte offset one past the chunk end in the source
    pub end: usize,
}

impl Chunk {
    /// Part of this chunk not already covered by `previous`
    pub fn fresh_text(&self, previous: Option<&Chunk>) -> &str {
        match previous {
            Some(prev) if prev.end > self.start => {
                let skip = (prev.end - self.start).min(self.text.len());
                &self.text[skip..]
            }
            _ => &self.text,
        }
    }
}

/// Splits text on a prioritized list of separators, recursing into pieces
/// that are still larger than the target size.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(CHUNK_SIZE_CHARS, CHUNK_OVERLAP_CHARS, default_legal_separators())
    }
}

impl RecursiveChunker {
    /// `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize, separators: Vec<String>) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk a document, tagging each chunk with its source
    pub fn chunk(&self, source: &str, text: &str) -> Vec<Chunk> {
        self.split_spans(text)
            .into_iter()
            .enumerate()
            .map(|(index, span)| Chunk {
                text: text[span.clone()].to_string(),
                source: source.to_string(),
                index,
                start: span.start,
                end: span.end,
            })
            .collect()
    }

    /// Byte spans of the chunks, in source order
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        self.split_recursive(text, 0..text.len(), 0, &mut pieces);
        self.merge_pieces(text, pieces)
    }

    fn split_recursive(
        &self,
        text: &str,
        span: Range<usize>,
        sep_idx: usize,
        out: &mut Vec<Range<usize>>,
    ) {
        let piece = &text[span.clone()];
        if char_len(piece) <= self.chunk_size {
            out.push(span);
            return;
        }

        for (offset, sep) in self.separators[sep_idx.min(self.separators.len())..]
            .iter()
            .enumerate()
        {
            if sep.is_empty() {
                // Last resort: individual characters, merged back up later
                for (i, c) in piece.char_indices() {
                    let start = span.start + i;
                    out.push(start..start + c.len_utf8());
                }
                return;
            }
            if piece.contains(sep.as_str()) {
                let next = sep_idx + offset + 1;
                for sub in split_keep_start(piece, sep) {
                    let sub = span.start + sub.start..span.start + sub.end;
                    if char_len(&text[sub.clone()]) <= self.chunk_size {
                        out.push(sub);
                    } else {
                        self.split_recursive(text, sub, next, out);
                    }
                }
                return;
            }
        }

        // Nothing left to split on
        out.push(span);
    }

    fn merge_pieces(&self, text: &str, pieces: Vec<Range<usize>>) -> Vec<Range<usize>> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&text[piece.clone()]);

            if total + len > self.chunk_size && !window.is_empty() {
                chunks.push(window_span(&window));
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, popped)) => total -= popped,
                        None => break,
                    }
                }
            }

            total += len;
            window.push_back((piece, len));
        }

        if !window.is_empty() {
            chunks.push(window_span(&window));
        }

        chunks
    }
}

fn window_span(window: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    let start = window.front().map(|(r, _)| r.start).unwrap_or(0);
    let end = window.back().map(|(r, _)| r.end).unwrap_or(start);
    start..end
}

/// Split `piece` at every occurrence of `sep`, keeping the separator at the
/// head of the following part.
fn split_keep_start(piece: &str, sep: &str) -> Vec<Range<usize>> {
    let mut parts = Vec::new();
    let mut last = 0;
    for (pos, _) in piece.match_indices(sep) {
        if pos > last {
            parts.push(last..pos);
            last = pos;
        }
    }
    parts.push(last..piece.len());
    parts
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
