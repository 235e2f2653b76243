//! ContratAI Core Library
//!
//! Core functionality for the contratai legal assistant.
//!
//! # Features
//! - Turn orchestration that answers directly or dispatches to a tool
//! - Retrieval over Brazilian statutes with query expansion, prefix
//!   deduplication and pairwise reranking
//! - Recursive, separator-aware chunking tuned for legal text
//! - Contract analysis, rewriting and template-based generation
//! - SQLite-backed vector index and chat session store

pub mod agent;
pub mod config;
pub mod context;
pub mod contracts;
pub mod db;
pub mod error;
pub mod index;
pub mod llm;
pub mod search;
pub mod tools;

pub use agent::{Orchestrator, Phase, TurnOutcome, TurnState};
pub use config::{Config, ContractMatchStrategy, LLMServiceConfig};
pub use context::{AppContext, Capabilities, Stores};
pub use db::{
    Database, IndexEntry, IndexHit, Message, NewMessage, Role, Session, SessionStore,
    SessionSummary, SourceCount, SourceFilter, SqliteVectorIndex, VectorIndex,
};
pub use error::{ContratAiError, Error, Result};
pub use index::{normalize_law_text, Chunk, CorpusBootstrap, RecursiveChunker};
pub use llm::{
    ChatMessage, Embedder, Generator, HttpEmbedder, HttpRelevanceScorer, LLMClient, LlmGenerator,
    MetricsSnapshot, PromptId, PromptLibrary, PromptVars, RelevanceScorer, VLLMClient,
};
pub use search::{Candidate, RetrievalPipeline, RetrievedContext};
pub use tools::{ToolArgs, ToolDescriptor, ToolInvocation, ToolOutput, ToolRegistry};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "contratai";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "contratai";
