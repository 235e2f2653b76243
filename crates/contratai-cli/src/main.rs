//! ContratAI CLI
//!
//! Chat with a legal assistant grounded on Brazilian statutes and contract
//! templates.

use anyhow::Result;
use clap::Parser;
use contratai_core::error::exit_codes;
use contratai_core::{Config, ContratAiError, Database};
use std::sync::Arc;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<ContratAiError>()
            .map(ContratAiError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Config(args) = cli.command {
        return commands::config::run(args).await;
    }

    let config = Config::load()?;

    // CONTRATAI_DB overrides the cache location
    let db_path = contratai_core::db::default_path();
    let db = Arc::new(Database::open(&db_path)?);
    db.initialize()?;

    match cli.command {
        Commands::Chat(args) => commands::chat::run(args, config, db, cli.format).await,
        Commands::Ask(args) => commands::chat::run_once(args, config, db, cli.format).await,
        Commands::Sessions(args) => commands::sessions::run(args, &db, cli.format).await,
        Commands::Tools => commands::tools::run(cli.format).await,
        Commands::Index(args) => commands::index::run(args, config, db, cli.format).await,
        Commands::Config(_) => Ok(()),
    }
}
