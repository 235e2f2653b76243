//! Session administration

use crate::app::{OutputFormat, SessionsAction, SessionsArgs};
use crate::output;
use anyhow::Result;
use contratai_core::{ContratAiError, Database, NewMessage, SessionStore};
use std::io::Read;
use std::path::Path;

pub async fn run(args: SessionsArgs, db: &Database, format: OutputFormat) -> Result<()> {
    match args.action {
        SessionsAction::List => {
            let sessions = db.list_sessions()?;
            print!("{}", output::format_sessions(&sessions, format));
        }
        SessionsAction::Show { id } => {
            let session = db
                .get_session(&id)?
                .ok_or(ContratAiError::SessionNotFound(id))?;
            print!("{}", output::format_session(&session, format));
        }
        SessionsAction::Create => {
            let id = db.create_session()?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "id": id })),
                OutputFormat::Cli => println!("{}", id),
            }
        }
        SessionsAction::Replace { id, file } => {
            let messages = read_messages(file.as_deref())?;
            db.replace_messages(&id, &messages)?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "id": id, "messages": messages.len() })
                ),
                OutputFormat::Cli => {
                    println!("Replaced session {} with {} messages", id, messages.len())
                }
            }
        }
        SessionsAction::Delete { id } => {
            db.delete_session(&id)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": id })),
                OutputFormat::Cli => println!("Deleted session {}", id),
            }
        }
        SessionsAction::Clear => {
            let removed = db.delete_all_sessions()?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": removed })),
                OutputFormat::Cli => println!("Deleted {} sessions", removed),
            }
        }
    }
    Ok(())
}

fn read_messages(file: Option<&Path>) -> Result<Vec<NewMessage>> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let messages = serde_json::from_str(&content).map_err(|e| {
        ContratAiError::InvalidInput(format!("expected a JSON list of {{role, content}}: {}", e))
    })?;
    Ok(messages)
}
