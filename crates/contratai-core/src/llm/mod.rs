//! LLM integration
//!
//! Provides traits and implementations for:
//! - Prompt-template generation
//! - Embedding generation via external services (Ollama, vLLM, OpenAI, etc.)
//! - Pairwise relevance scoring

mod cache;
mod client;
mod generator;
mod http_embedder;
mod http_scorer;
pub mod json;
pub mod prompts;
mod traits;

pub use client::{ChatMessage, LLMClient, MetricsSnapshot, VLLMClient};
pub use generator::LlmGenerator;
pub use http_embedder::HttpEmbedder;
pub use http_scorer::HttpRelevanceScorer;
pub use prompts::{PromptId, PromptLibrary, PromptVars};
pub use traits::*;
