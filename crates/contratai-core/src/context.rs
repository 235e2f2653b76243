//! Capabilities and stores shared by every turn

use crate::config::Config;
use crate::db::{Database, SessionStore, SqliteVectorIndex, VectorIndex};
use crate::db::{CONTRACTS_COLLECTION, LAWS_COLLECTION};
use crate::error::Result;
use crate::index::CorpusBootstrap;
use crate::llm::{
    Embedder, Generator, HttpEmbedder, HttpRelevanceScorer, LLMClient, LlmGenerator,
    PromptLibrary, RelevanceScorer, VLLMClient,
};
use crate::search::RetrievalPipeline;
use std::path::Path;
use std::sync::Arc;

/// Model-backed capabilities
#[derive(Clone)]
pub struct Capabilities {
    pub generator: Arc<dyn Generator>,
    pub embedder: Arc<dyn Embedder>,
    pub scorer: Arc<dyn RelevanceScorer>,
}

/// Persistent stores
#[derive(Clone)]
pub struct Stores {
    pub laws: Arc<dyn VectorIndex>,
    pub contracts: Arc<dyn VectorIndex>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Everything a turn or a tool may reach, passed explicitly
pub struct AppContext {
    pub config: Config,
    pub generator: Arc<dyn Generator>,
    pub embedder: Arc<dyn Embedder>,
    pub scorer: Arc<dyn RelevanceScorer>,
    pub laws: Arc<dyn VectorIndex>,
    pub contracts: Arc<dyn VectorIndex>,
    pub sessions: Arc<dyn SessionStore>,
    pub bootstrap: Arc<CorpusBootstrap>,
}

impl AppContext {
    pub fn new(config: Config, capabilities: Capabilities, stores: Stores) -> Self {
        let bootstrap = Arc::new(CorpusBootstrap::new(
            config.paths.laws_dir.clone(),
            &config.chunking,
        ));
        Self {
            generator: capabilities.generator,
            embedder: capabilities.embedder,
            scorer: capabilities.scorer,
            laws: stores.laws,
            contracts: stores.contracts,
            sessions: stores.sessions,
            bootstrap,
            config,
        }
    }

    /// Wire the HTTP model client and the SQLite database at `db_path`
    pub fn open(config: Config, db_path: &Path) -> Result<Self> {
        let db = Arc::new(Database::open(db_path)?);
        db.initialize()?;
        Self::with_database(config, db)
    }

    /// Wire the HTTP model client over an already initialized database
    pub fn with_database(config: Config, db: Arc<Database>) -> Result<Self> {
        let client: Arc<dyn LLMClient> = Arc::new(VLLMClient::new(config.llm_service.clone())?);
        let prompts = match &config.paths.prompts_dir {
            Some(dir) => PromptLibrary::with_overrides(dir)?,
            None => PromptLibrary::builtin(),
        };

        let capabilities = Capabilities {
            generator: Arc::new(LlmGenerator::new(client.clone(), prompts)),
            embedder: Arc::new(HttpEmbedder::new(client.clone())),
            scorer: Arc::new(HttpRelevanceScorer::new(client)),
        };
        let stores = Stores {
            laws: Arc::new(SqliteVectorIndex::new(db.clone(), LAWS_COLLECTION)),
            contracts: Arc::new(SqliteVectorIndex::new(db.clone(), CONTRACTS_COLLECTION)),
            sessions: db,
        };

        Ok(Self::new(config, capabilities, stores))
    }

    pub fn retrieval_pipeline(&self) -> RetrievalPipeline {
        RetrievalPipeline::new(
            self.generator.clone(),
            self.embedder.clone(),
            self.scorer.clone(),
            self.laws.clone(),
            self.bootstrap.clone(),
            self.config.retrieval.clone(),
        )
    }
}
