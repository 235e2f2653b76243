//! Lazy, once-only population of the law index
//!
//! The first retrieval against an empty index reads every `.txt` statute in
//! the corpus directory, chunks it and stores the embedded passages. Later
//! calls see a non-empty index and return immediately.

use super::chunker::{Chunk, RecursiveChunker};
use super::normalize::normalize_law_text;
use crate::config::ChunkingConfig;
use crate::db::{IndexEntry, VectorIndex};
use crate::error::{ContratAiError, Result};
use crate::llm::Embedder;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use walkdir::WalkDir;

const BATCH_SIZE: usize = 32;
const PROGRESS_EVERY: usize = 100;

/// What a bootstrap run stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapStats {
    pub sources: usize,
    pub chunks: usize,
}

/// A statute read from the corpus directory
#[derive(Debug, Clone)]
pub struct LawDocument {
    /// Path relative to the corpus directory, `/`-separated
    pub source: String,
    pub content: String,
}

pub struct CorpusBootstrap {
    laws_dir: PathBuf,
    chunker: RecursiveChunker,
    normalize: bool,
    lock: Mutex<()>,
}

impl CorpusBootstrap {
    pub fn new(laws_dir: impl Into<PathBuf>, chunking: &ChunkingConfig) -> Self {
        Self {
            laws_dir: laws_dir.into(),
            chunker: RecursiveChunker::new(
                chunking.chunk_size,
                chunking.chunk_overlap,
                chunking.separators.clone(),
            ),
            normalize: chunking.normalize,
            lock: Mutex::new(()),
        }
    }

    pub fn laws_dir(&self) -> &Path {
        &self.laws_dir
    }

    /// Populate `index` if it is empty. Returns `None` when it already had
    /// passages. Concurrent callers wait on the lock and re-check the count,
    /// so the corpus is loaded at most once.
    pub async fn ensure(
        &self,
        index: &dyn VectorIndex,
        embedder: &dyn Embedder,
    ) -> Result<Option<BootstrapStats>> {
        if index.count()? > 0 {
            return Ok(None);
        }

        let _guard = self.lock.lock().await;
        if index.count()? > 0 {
            return Ok(None);
        }

        tracing::info!(
            "Law index is empty, bootstrapping from {}",
            self.laws_dir.display()
        );
        self.build(index, embedder).await.map(Some)
    }

    /// Chunk, embed and store the whole corpus unconditionally. On failure
    /// the collection is cleared so the next call starts from empty.
    pub async fn build(
        &self,
        index: &dyn VectorIndex,
        embedder: &dyn Embedder,
    ) -> Result<BootstrapStats> {
        let documents = load_corpus(&self.laws_dir)?;
        let chunks = self.chunk_documents(&documents);

        if chunks.is_empty() {
            return Err(ContratAiError::CorpusBootstrapFailure(format!(
                "no law text found in {}",
                self.laws_dir.display()
            )));
        }

        let stored = match store_chunks(&chunks, index, embedder).await {
            Ok(stored) => stored,
            Err(e) => {
                match index.clear() {
                    Ok(removed) => {
                        tracing::warn!("Bootstrap failed, removed {} partial passages", removed)
                    }
                    Err(clear_err) => {
                        tracing::error!("Cannot clear partial law index: {}", clear_err)
                    }
                }
                return Err(match e {
                    ContratAiError::CorpusBootstrapFailure(_) => e,
                    other => ContratAiError::CorpusBootstrapFailure(format!(
                        "cannot store passages: {}",
                        other
                    )),
                });
            }
        };

        tracing::info!(
            "Law index initialized with {} chunks from {} files",
            stored,
            documents.len()
        );

        Ok(BootstrapStats {
            sources: documents.len(),
            chunks: stored,
        })
    }

    fn chunk_documents(&self, documents: &[LawDocument]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| {
                if self.normalize {
                    self.chunker
                        .chunk(&doc.source, &normalize_law_text(&doc.content))
                } else {
                    self.chunker.chunk(&doc.source, &doc.content)
                }
            })
            .collect()
    }
}

/// Embed `chunks` in batches and upsert them as `law_chunk_<n>`
async fn store_chunks(
    chunks: &[Chunk],
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
) -> Result<usize> {
    let total = chunks.len();
    let mut stored = 0;

    for batch in chunks.chunks(BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await.map_err(|e| {
            ContratAiError::CorpusBootstrapFailure(format!("embedding failed: {}", e))
        })?;

        if embeddings.len() != batch.len() {
            return Err(ContratAiError::CorpusBootstrapFailure(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        for (chunk, embedding) in batch.iter().zip(embeddings) {
            index.upsert(IndexEntry {
                id: format!("law_chunk_{}", stored),
                source: chunk.source.clone(),
                chunk_index: chunk.index,
                text: chunk.text.clone(),
                embedding,
            })?;
            stored += 1;

            if stored % PROGRESS_EVERY == 0 || stored == total {
                tracing::info!(
                    "Progress: {}/{} chunks ({:.1}%)",
                    stored,
                    total,
                    stored as f64 / total as f64 * 100.0
                );
            }
        }
    }

    Ok(stored)
}

/// Read every `.txt` file under `dir`, sorted by path. Blank files are
/// skipped; a missing directory or unreadable file is a bootstrap failure.
pub fn load_corpus(dir: &Path) -> Result<Vec<LawDocument>> {
    if !dir.is_dir() {
        return Err(ContratAiError::CorpusBootstrapFailure(format!(
            "corpus directory not found: {}",
            dir.display()
        )));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            ContratAiError::CorpusBootstrapFailure(format!("cannot walk {}: {}", dir.display(), e))
        })?;

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt")
        {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ContratAiError::CorpusBootstrapFailure(format!("cannot read {}: {}", path.display(), e))
        })?;

        if content.trim().is_empty() {
            tracing::warn!("Skipping empty law file {}", path.display());
            continue;
        }

        let source = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        documents.push(LawDocument { source, content });
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, SqliteVectorIndex, LAWS_COLLECTION};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    /// Fails every `embed_batch` call after the first `ok_batches`
    struct FlakyEmbedder {
        ok_batches: usize,
        batches: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.batches.fetch_add(1, Ordering::SeqCst) >= self.ok_batches {
                return Err(ContratAiError::Llm("embedding service unavailable".into()));
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    fn corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("codigo_civil.txt"),
            "Art. 1º Toda pessoa é capaz de direitos e deveres na ordem civil.\n\nArt. 2º A personalidade civil da pessoa começa do nascimento com vida.",
        )
        .unwrap();
        std::fs::write(dir.path().join("vazio.txt"), "   \n").unwrap();
        std::fs::write(dir.path().join("notas.md"), "ignorado").unwrap();
        dir
    }

    fn small_chunks() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 80,
            chunk_overlap: 10,
            ..ChunkingConfig::default()
        }
    }

    #[test]
    fn test_load_corpus_filters_and_names_sources() {
        let dir = corpus();
        let docs = load_corpus(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "codigo_civil.txt");
    }

    #[test]
    fn test_load_corpus_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_corpus(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ContratAiError::CorpusBootstrapFailure(_)));
    }

    #[tokio::test]
    async fn test_ensure_runs_once() {
        let dir = corpus();
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.initialize().unwrap();
        let index = SqliteVectorIndex::new(db, LAWS_COLLECTION);
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let bootstrap = CorpusBootstrap::new(dir.path(), &small_chunks());

        let stats = bootstrap.ensure(&index, &embedder).await.unwrap().unwrap();
        assert_eq!(stats.sources, 1);
        assert!(stats.chunks >= 2);
        assert_eq!(index.count().unwrap(), stats.chunks);

        let embedded = embedder.calls.load(Ordering::SeqCst);
        assert!(bootstrap.ensure(&index, &embedder).await.unwrap().is_none());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), embedded);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.initialize().unwrap();
        let index = SqliteVectorIndex::new(db, LAWS_COLLECTION);
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let bootstrap = CorpusBootstrap::new(dir.path(), &ChunkingConfig::default());

        let err = bootstrap.ensure(&index, &embedder).await.unwrap_err();
        assert!(matches!(err, ContratAiError::CorpusBootstrapFailure(_)));
        assert_eq!(index.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_index_empty_and_retry_rebuilds() {
        let dir = TempDir::new().unwrap();
        let articles: String = (1..=60)
            .map(|n| format!("Art. {}º O locatário responde pelo dano {}.\n\n", n, n))
            .collect();
        std::fs::write(dir.path().join("lei_inquilinato.txt"), articles).unwrap();

        let db = Arc::new(Database::open_in_memory().unwrap());
        db.initialize().unwrap();
        let index = SqliteVectorIndex::new(db, LAWS_COLLECTION);
        let chunking = ChunkingConfig {
            chunk_size: 40,
            chunk_overlap: 5,
            ..ChunkingConfig::default()
        };
        let bootstrap = CorpusBootstrap::new(dir.path(), &chunking);

        let flaky = FlakyEmbedder {
            ok_batches: 1,
            batches: AtomicUsize::new(0),
        };
        let err = bootstrap.ensure(&index, &flaky).await.unwrap_err();
        assert!(matches!(err, ContratAiError::CorpusBootstrapFailure(_)));
        assert_eq!(flaky.batches.load(Ordering::SeqCst), 2);
        assert_eq!(index.count().unwrap(), 0);

        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let stats = bootstrap.ensure(&index, &embedder).await.unwrap().unwrap();
        assert!(stats.chunks > BATCH_SIZE);
        assert_eq!(index.count().unwrap(), stats.chunks);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), stats.chunks);
    }
}
