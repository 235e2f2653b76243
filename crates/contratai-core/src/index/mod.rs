//! Indexing pipeline
//!
//! Statute normalization, recursive chunking and the lazy corpus bootstrap.

mod bootstrap;
mod chunker;
mod normalize;

pub use bootstrap::{load_corpus, BootstrapStats, CorpusBootstrap, LawDocument};
pub use chunker::*;
pub use normalize::normalize_law_text;
