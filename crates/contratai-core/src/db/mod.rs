//! Database layer
//!
//! One SQLite file backs both the chat sessions and every vector collection.

mod schema;
pub mod sessions;
pub mod vectors;

pub use schema::Database;
pub use sessions::{
    format_history, Message, NewMessage, Role, Session, SessionStore, SessionSummary,
};
pub use vectors::{
    IndexEntry, IndexHit, SourceCount, SourceFilter, SqliteVectorIndex, VectorIndex,
    CONTRACTS_COLLECTION, LAWS_COLLECTION,
};

use std::path::PathBuf;

/// Database location: `CONTRATAI_DB`, else the user cache directory
pub fn default_path() -> PathBuf {
    if let Ok(path) = std::env::var("CONTRATAI_DB") {
        return PathBuf::from(path);
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::CACHE_DIR_NAME)
        .join("index.sqlite")
}
