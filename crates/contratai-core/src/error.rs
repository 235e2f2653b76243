//! Error types for contratai

use thiserror::Error;

/// Result type alias using ContratAiError
pub type Result<T> = std::result::Result<T, ContratAiError>;

/// Error type alias for convenience
pub type Error = ContratAiError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for contratai
#[derive(Debug, Error)]
pub enum ContratAiError {
    /// A capability returned text that does not fit the expected structured shape
    #[error("Malformed generation output: {0}")]
    MalformedGenerationOutput(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Corpus bootstrap failed: {0}")]
    CorpusBootstrapFailure(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ContratAiError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToolNotFound(_) | Self::SourceNotFound(_) | Self::SessionNotFound(_) => {
                exit_codes::NOT_FOUND
            }
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
