//! Chat and ask commands

use crate::app::{AskArgs, ChatArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use contratai_core::{AppContext, Config, Database, Orchestrator, SessionStore, ToolRegistry};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn orchestrator(config: Config, db: Arc<Database>) -> Result<Orchestrator> {
    let ctx = AppContext::with_database(config, db)?;
    Ok(Orchestrator::new(Arc::new(ctx), ToolRegistry::builtin()))
}

/// Requested session id, or a freshly created session
fn resolve_session(db: &Database, requested: Option<String>) -> Result<String> {
    match requested {
        Some(id) => Ok(id),
        None => Ok(db.create_session()?),
    }
}

pub async fn run(
    args: ChatArgs,
    config: Config,
    db: Arc<Database>,
    format: OutputFormat,
) -> Result<()> {
    let session_id = resolve_session(&db, args.session)?;
    let orchestrator = orchestrator(config, db)?;
    let interactive = format == OutputFormat::Cli;

    if interactive {
        println!(
            "ContratAI (sessão {}). Faça sua pergunta; Ctrl-D encerra.",
            session_id
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush().ok();
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        match orchestrator.run_turn(&session_id, question).await {
            Ok(outcome) => {
                print!("{}", output::format_turn(&outcome, format));
                if outcome.exit_requested {
                    break;
                }
            }
            // The turn already stored the question; keep the session open
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

pub async fn run_once(
    args: AskArgs,
    config: Config,
    db: Arc<Database>,
    format: OutputFormat,
) -> Result<()> {
    let question = args.question.join(" ");
    let session_id = resolve_session(&db, args.session)?;
    let orchestrator = orchestrator(config, db)?;

    let outcome = orchestrator.run_turn(&session_id, &question).await?;
    print!("{}", output::format_turn(&outcome, format));
    Ok(())
}
