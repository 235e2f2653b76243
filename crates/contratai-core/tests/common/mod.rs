//! Scripted capabilities and a temp-dir workspace for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use contratai_core::config::Config;
use contratai_core::db::{CONTRACTS_COLLECTION, LAWS_COLLECTION};
use contratai_core::{
    AppContext, Capabilities, ContratAiError, Database, Embedder, Generator, PromptId, PromptVars,
    RelevanceScorer, Result, SqliteVectorIndex, Stores,
};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Generator replaying canned outputs per prompt. Queued outputs are used
/// first, then the prompt's repeating output, if any.
#[derive(Default)]
pub struct ScriptedGenerator {
    queued: Mutex<HashMap<PromptId, VecDeque<String>>>,
    repeating: Mutex<HashMap<PromptId, String>>,
    calls: Mutex<Vec<(PromptId, PromptVars)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(self, prompt: PromptId, output: &str) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(prompt)
            .or_default()
            .push_back(output.to_string());
        self
    }

    pub fn always(self, prompt: PromptId, output: &str) -> Self {
        self.repeating
            .lock()
            .unwrap()
            .insert(prompt, output.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(PromptId, PromptVars)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prompt: PromptId) -> Vec<PromptVars> {
        self.calls()
            .into_iter()
            .filter(|(p, _)| *p == prompt)
            .map(|(_, v)| v)
            .collect()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: PromptId, vars: &PromptVars) -> Result<String> {
        self.calls.lock().unwrap().push((prompt, vars.clone()));

        if let Some(output) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&prompt)
            .and_then(VecDeque::pop_front)
        {
            return Ok(output);
        }
        self.repeating
            .lock()
            .unwrap()
            .get(&prompt)
            .cloned()
            .ok_or_else(|| ContratAiError::Llm(format!("no scripted output for {}", prompt)))
    }
}

const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: each lowercase word bumps one hashed dimension
#[derive(Default)]
pub struct HashEmbedder {
    pub embedded: AtomicUsize,
}

impl HashEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMENSIONS];
        for word in words(text) {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            v[(hasher.finish() as usize) % DIMENSIONS] += 1.0;
        }
        v
    }

    pub fn embedded(&self) -> usize {
        self.embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        // Yield so concurrent callers can interleave
        tokio::task::yield_now().await;
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "hash-bow"
    }
}

/// Scores a passage by the share of query words it contains
#[derive(Default)]
pub struct OverlapScorer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RelevanceScorer for OverlapScorer {
    async fn score_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(pairs
            .iter()
            .map(|(query, passage)| {
                let query_words = words(query);
                if query_words.is_empty() {
                    return 0.0;
                }
                let passage_words = words(passage);
                let hits = query_words
                    .iter()
                    .filter(|w| passage_words.contains(w))
                    .count();
                hits as f64 / query_words.len() as f64
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "overlap"
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub const CIVIL_CODE: &str = "\
Art. 1º Toda pessoa é capaz de direitos e deveres na ordem civil.
Art. 2º A personalidade civil da pessoa começa do nascimento com vida; mas a lei põe a salvo, desde a concepção, os direitos do nascituro.
Art. 3º São absolutamente incapazes de exercer pessoalmente os atos da vida civil os menores de 16 (dezesseis) anos.
Art. 4º São incapazes, relativamente a certos atos ou à maneira de os exercer, os maiores de dezesseis e menores de dezoito anos.
Art. 5º A menoridade cessa aos dezoito anos completos, quando a pessoa fica habilitada à prática de todos os atos da vida civil.";

pub const CONSUMER_CODE: &str = "\
Art. 6º São direitos básicos do consumidor a proteção da vida, saúde e segurança contra os riscos provocados por práticas no fornecimento de produtos.
Art. 49. O consumidor pode desistir do contrato, no prazo de 7 dias a contar de sua assinatura ou do ato de recebimento do produto ou serviço.";

pub const CATALOGUE: &str = r#"{
    "contrato_locacao": {
        "description": "Contrato de locação residencial",
        "required_fields": ["locador", "locatario", "endereco", "valor_aluguel"]
    },
    "contrato_prestacao_servicos": {
        "description": "Contrato de prestação de serviços",
        "required_fields": ["contratante", "contratado", "servico", "valor"]
    }
}"#;

pub const LEASE_TEMPLATE: &str = "CONTRATO DE LOCAÇÃO RESIDENCIAL\n\nLOCADOR: [LOCADOR]\nLOCATÁRIO: [LOCATARIO]\nIMÓVEL: [ENDERECO]\nALUGUEL: [VALOR_ALUGUEL]";

/// A wired context over an in-memory database and a temp workspace
pub struct Harness {
    pub ctx: Arc<AppContext>,
    pub generator: Arc<ScriptedGenerator>,
    pub embedder: Arc<HashEmbedder>,
    pub scorer: Arc<OverlapScorer>,
    pub db: Arc<Database>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(generator: ScriptedGenerator) -> Self {
        Self::with_config(generator, |_| {})
    }

    pub fn with_config(generator: ScriptedGenerator, adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        let laws = root.join("laws");
        std::fs::create_dir_all(&laws).unwrap();
        std::fs::write(laws.join("codigo_civil.txt"), CIVIL_CODE).unwrap();
        std::fs::write(laws.join("cdc.txt"), CONSUMER_CODE).unwrap();

        let contracts = root.join("contracts");
        std::fs::create_dir_all(&contracts).unwrap();
        std::fs::write(contracts.join("contrato_locacao.txt"), LEASE_TEMPLATE).unwrap();
        std::fs::write(root.join("contract_fields_mapping.json"), CATALOGUE).unwrap();

        let mut config = Config::default();
        config.paths.laws_dir = laws;
        config.paths.contracts_dir = contracts;
        config.paths.catalogue = root.join("contract_fields_mapping.json");
        config.paths.output_dir = root.join("out");
        config.chunking.chunk_size = 160;
        config.chunking.chunk_overlap = 40;
        adjust(&mut config);

        let db = Arc::new(Database::open_in_memory().unwrap());
        db.initialize().unwrap();

        let generator = Arc::new(generator);
        let embedder = Arc::new(HashEmbedder::default());
        let scorer = Arc::new(OverlapScorer::default());

        let ctx = AppContext::new(
            config,
            Capabilities {
                generator: generator.clone(),
                embedder: embedder.clone(),
                scorer: scorer.clone(),
            },
            Stores {
                laws: Arc::new(SqliteVectorIndex::new(db.clone(), LAWS_COLLECTION)),
                contracts: Arc::new(SqliteVectorIndex::new(db.clone(), CONTRACTS_COLLECTION)),
                sessions: db.clone(),
            },
        );

        Self {
            ctx: Arc::new(ctx),
            generator,
            embedder,
            scorer,
            db,
            dir,
        }
    }

    pub fn output_dir(&self) -> std::path::PathBuf {
        self.ctx.config.paths.output_dir.clone()
    }
}
