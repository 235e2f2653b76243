//! Law index commands

use crate::app::{IndexAction, IndexArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use contratai_core::db::LAWS_COLLECTION;
use contratai_core::{
    AppContext, Config, ContratAiError, Database, SqliteVectorIndex, VectorIndex,
};
use std::sync::Arc;

pub async fn run(
    args: IndexArgs,
    config: Config,
    db: Arc<Database>,
    format: OutputFormat,
) -> Result<()> {
    let index = SqliteVectorIndex::new(db.clone(), LAWS_COLLECTION);

    match args.action {
        IndexAction::Build { force } => {
            if force {
                let removed = index.clear()?;
                tracing::info!("Removed {} law passages", removed);
            }

            let ctx = AppContext::with_database(config, db)?;
            println!("Indexing laws from {}", ctx.bootstrap.laws_dir().display());

            match ctx.bootstrap.ensure(&index, ctx.embedder.as_ref()).await? {
                Some(stats) => match format {
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::json!({ "sources": stats.sources, "chunks": stats.chunks })
                    ),
                    OutputFormat::Cli => println!(
                        "Indexed {} passages from {} files",
                        stats.chunks, stats.sources
                    ),
                },
                None => println!(
                    "Law index already holds {} passages (use --force to rebuild)",
                    index.count()?
                ),
            }
        }
        IndexAction::Status => {
            print!("{}", output::format_sources(&index.sources()?, format));
        }
        IndexAction::Show { limit, source, id } => {
            let passages = match (id, source) {
                (Some(id), _) => {
                    let hit = index
                        .get(&id)?
                        .ok_or_else(|| ContratAiError::SourceNotFound(format!("passage {}", id)))?;
                    vec![hit]
                }
                (None, Some(source)) => index.by_source(&source, limit)?,
                (None, None) => index.peek(limit)?,
            };
            print!("{}", output::format_passages(&passages, format));
        }
    }
    Ok(())
}
