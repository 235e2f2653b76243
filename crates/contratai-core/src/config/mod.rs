//! Configuration management

use crate::error::{ContratAiError, Result};
use crate::index::{default_legal_separators, CHUNK_OVERLAP_CHARS, CHUNK_SIZE_CHARS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Retrieval pipeline tuning
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Corpus chunking
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Filesystem locations for corpus, templates and outputs
    #[serde(default)]
    pub paths: PathsConfig,

    /// Turn orchestration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Contract generation
    #[serde(default)]
    pub contracts: ContractsConfig,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions (informational; the index stores whatever the model returns)
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for chat completions
    #[serde(default)]
    pub temperature: f32,

    /// Completion token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Ask the service for a JSON object response
    #[serde(default = "default_true")]
    pub json_mode: bool,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("CONTRATAI_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("CONTRATAI_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: None,
            api_key: std::env::var("CONTRATAI_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            json_mode: true,
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("CONTRATAI_LLM_MODEL").unwrap_or_else(|_| "mistral-nemo:12b".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("CONTRATAI_EMBEDDING_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string())
}

fn default_timeout() -> u64 {
    120
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_true() -> bool {
    true
}

/// Retrieval pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Nearest passages fetched for the original question
    pub direct_top_k: usize,
    /// Paraphrases requested from the expander
    pub paraphrase_count: usize,
    /// Nearest passages fetched per paraphrase
    pub expansion_top_k: usize,
    /// Passages taken from each paraphrase branch during merge
    pub expansion_per_branch: usize,
    /// Upper bound on the merged candidate set
    pub merge_cap: usize,
    /// Prefix length used as the dedup identity of a passage
    pub dedup_prefix_chars: usize,
    /// Passages kept after reranking
    pub rerank_top_k: usize,
    /// Ask the model to narrow the search to specific law files
    pub source_filter: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            direct_top_k: 25,
            paraphrase_count: 2,
            expansion_top_k: 3,
            expansion_per_branch: 2,
            merge_cap: 25,
            dedup_prefix_chars: 100,
            rerank_top_k: 5,
            source_filter: true,
        }
    }
}

/// Chunking parameters for the law corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Ordered separator hierarchy, most significant first
    pub separators: Vec<String>,
    /// Run the legal text normalizer before chunking
    pub normalize: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE_CHARS,
            chunk_overlap: CHUNK_OVERLAP_CHARS,
            separators: default_legal_separators(),
            normalize: true,
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory of law `.txt` files used to bootstrap the index
    pub laws_dir: PathBuf,
    /// Directory of contract templates (`<type>.txt`)
    pub contracts_dir: PathBuf,
    /// Contract catalogue (`contract_fields_mapping.json`)
    pub catalogue: PathBuf,
    /// Where generated and refactored contracts are written
    pub output_dir: PathBuf,
    /// Optional directory of prompt overrides (`<prompt_id>.txt`)
    pub prompts_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            laws_dir: PathBuf::from("rag_files/laws"),
            contracts_dir: PathBuf::from("rag_files/contracts"),
            catalogue: PathBuf::from("contract_fields_mapping.json"),
            output_dir: PathBuf::from("."),
            prompts_dir: None,
        }
    }
}

/// Turn orchestration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Characters of history shown to the generation capability
    pub history_max_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_max_chars: 8000,
        }
    }
}

/// How a contract request is mapped to a catalogued type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractMatchStrategy {
    /// Closed-set classification over the catalogue
    #[default]
    Classifier,
    /// Nearest template by embedding, then a confirmation call
    NearestTemplate,
}

/// Contract generation parameters
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContractsConfig {
    pub strategy: ContractMatchStrategy,
}

impl Config {
    /// Load config from `CONTRATAI_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = Self::path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to [`Config::path`]
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Config file in use: `CONTRATAI_CONFIG`, else [`Config::default_path`]
    pub fn path() -> PathBuf {
        std::env::var("CONTRATAI_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(ContratAiError::Config("chunking.chunk_size must be > 0".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ContratAiError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.merge_cap == 0 || self.retrieval.rerank_top_k == 0 {
            return Err(ContratAiError::Config(
                "retrieval.merge_cap and retrieval.rerank_top_k must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let config = Config::default();
        assert_eq!(config.retrieval.direct_top_k, 25);
        assert_eq!(config.retrieval.merge_cap, 25);
        assert_eq!(config.retrieval.rerank_top_k, 5);
        assert_eq!(config.retrieval.dedup_prefix_chars, 100);
        assert_eq!(config.agent.history_max_chars, 8000);
        assert_eq!(config.chunking.chunk_size, 1200);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "retrieval:\n  expansion_top_k: 5\ncontracts:\n  strategy: nearest_template\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.retrieval.expansion_top_k, 5);
        assert_eq!(config.retrieval.direct_top_k, 25);
        assert_eq!(config.contracts.strategy, ContractMatchStrategy::NearestTemplate);
    }

    #[test]
    fn test_save_to_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        let mut config = Config::default();
        config.agent.history_max_chars = 4000;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.agent.history_max_chars, 4000);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(ContratAiError::Config(_))));
    }
}
