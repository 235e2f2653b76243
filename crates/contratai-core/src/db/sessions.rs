//! Chat session persistence

use super::Database;
use crate::error::{ContratAiError, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "assistant" => Role::Assistant,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
}

/// Message supplied by a caller replacing a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

/// Session listing entry
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Persistent conversation storage.
///
/// `append_message` creates the session on first reference and always bumps
/// `updated_at`; writes for one id are serialized by the implementation.
pub trait SessionStore: Send + Sync {
    fn append_message(&self, session_id: &str, role: Role, content: &str) -> Result<()>;

    /// Messages in insertion order; empty for unknown sessions
    fn load_history(&self, session_id: &str) -> Result<Vec<Message>>;

    fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// Create an empty session with a fresh short id
    fn create_session(&self) -> Result<String>;

    /// Swap the whole message list of a session, creating it if needed
    fn replace_messages(&self, session_id: &str, messages: &[NewMessage]) -> Result<()>;

    fn delete_session(&self, session_id: &str) -> Result<()>;

    fn delete_all_sessions(&self) -> Result<usize>;
}

/// Render messages as the `\nUser: ...\nAssistant: ...` transcript the
/// prompts expect.
pub fn format_history(messages: &[Message]) -> String {
    let mut history = String::new();
    for msg in messages {
        let prefix = match msg.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        history.push_str(&format!("\n{}: {}", prefix, msg.content));
    }
    history
}

impl SessionStore for Database {
    fn append_message(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;

        conn.execute("BEGIN IMMEDIATE", [])?;
        let result = (|| {
            conn.execute(
                "INSERT INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?2)
                 ON CONFLICT(id) DO UPDATE SET updated_at = ?2",
                params![session_id, now],
            )?;
            conn.execute(
                "INSERT INTO messages (session_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, role.as_str(), content, now],
            )?;
            Ok(())
        })();

        if result.is_ok() {
            conn.execute("COMMIT", [])?;
        } else {
            let _ = conn.execute("ROLLBACK", []);
        }
        result
    }

    fn load_history(&self, session_id: &str) -> Result<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT created_at, role, content FROM messages
             WHERE session_id = ?1 ORDER BY id",
        )?;

        let messages = stmt
            .query_map(params![session_id], |row| {
                let created_at: String = row.get(0)?;
                let role: String = row.get(1)?;
                Ok(Message {
                    timestamp: parse_timestamp(0, &created_at)?,
                    role: Role::parse(&role),
                    content: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let header = {
            let conn = self.conn()?;
            let result = conn.query_row(
                "SELECT id, created_at, updated_at FROM sessions WHERE id = ?1",
                params![session_id],
                |row| {
                    let created: String = row.get(1)?;
                    let updated: String = row.get(2)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        parse_timestamp(1, &created)?,
                        parse_timestamp(2, &updated)?,
                    ))
                },
            );
            match result {
                Ok(header) => header,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        };

        let (id, created_at, updated_at) = header;
        let messages = self.load_history(&id)?;
        Ok(Some(Session {
            id,
            created_at,
            updated_at,
            messages,
        }))
    }

    fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.created_at, s.updated_at,
                    (SELECT COUNT(*) FROM messages m WHERE m.session_id = s.id)
             FROM sessions s ORDER BY s.updated_at DESC",
        )?;

        let sessions = stmt
            .query_map([], |row| {
                let created: String = row.get(1)?;
                let updated: String = row.get(2)?;
                Ok(SessionSummary {
                    id: row.get(0)?,
                    created_at: parse_timestamp(1, &created)?,
                    updated_at: parse_timestamp(2, &updated)?,
                    message_count: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    fn create_session(&self) -> Result<String> {
        let id = generate_session_id();
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![id, now],
        )?;
        Ok(id)
    }

    fn replace_messages(&self, session_id: &str, messages: &[NewMessage]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;

        conn.execute("BEGIN IMMEDIATE", [])?;
        let result = (|| {
            conn.execute(
                "INSERT INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?2)
                 ON CONFLICT(id) DO UPDATE SET updated_at = ?2",
                params![session_id, now],
            )?;
            conn.execute(
                "DELETE FROM messages WHERE session_id = ?1",
                params![session_id],
            )?;
            let mut stmt = conn.prepare(
                "INSERT INTO messages (session_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for msg in messages {
                stmt.execute(params![session_id, msg.role.as_str(), msg.content, now])?;
            }
            Ok(())
        })();

        if result.is_ok() {
            conn.execute("COMMIT", [])?;
        } else {
            let _ = conn.execute("ROLLBACK", []);
        }
        result
    }

    fn delete_session(&self, session_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        if deleted == 0 {
            return Err(ContratAiError::SessionNotFound(session_id.to_string()));
        }
        Ok(())
    }

    fn delete_all_sessions(&self) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM messages", [])?;
        let deleted = conn.execute("DELETE FROM sessions", [])?;
        Ok(deleted)
    }
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Short session id (8 hex chars), unique within the process
pub fn generate_session_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let pid = std::process::id();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mixed = (timestamp ^ (pid as u128 * 6_364_136_223_846_793_005))
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(seq as u128);

    format!("{:08x}", ((mixed >> 64) as u32) ^ (seq as u32).wrapping_mul(0x9E37_79B9))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    #[test]
    fn test_append_creates_session_on_first_reference() {
        let db = db();
        assert!(db.get_session("abc12345").unwrap().is_none());

        db.append_message("abc12345", Role::User, "Olá").unwrap();

        let session = db.get_session("abc12345").unwrap().unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[0].content, "Olá");
    }

    #[test]
    fn test_append_bumps_updated_at_and_keeps_order() {
        let db = db();
        db.append_message("s1", Role::User, "pergunta").unwrap();
        let first = db.get_session("s1").unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        db.append_message("s1", Role::Assistant, "resposta").unwrap();
        let second = db.get_session("s1").unwrap().unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at > first.updated_at);
        let roles: Vec<Role> = second.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn test_load_history_unknown_session_is_empty() {
        let db = db();
        assert!(db.load_history("nope").unwrap().is_empty());
    }

    #[test]
    fn test_format_history() {
        let db = db();
        db.append_message("s", Role::User, "Oi").unwrap();
        db.append_message("s", Role::Assistant, "Olá!").unwrap();
        let history = format_history(&db.load_history("s").unwrap());
        assert_eq!(history, "\nUser: Oi\nAssistant: Olá!");
    }

    #[test]
    fn test_session_lifecycle() {
        let db = db();
        let id = db.create_session().unwrap();
        assert_eq!(id.len(), 8);

        db.append_message(&id, Role::User, "x").unwrap();
        db.append_message("other", Role::User, "y").unwrap();

        let listed = db.list_sessions().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|s| s.message_count == 1));

        db.delete_session(&id).unwrap();
        assert!(db.get_session(&id).unwrap().is_none());
        assert!(matches!(
            db.delete_session(&id),
            Err(ContratAiError::SessionNotFound(_))
        ));

        assert_eq!(db.delete_all_sessions().unwrap(), 1);
        assert!(db.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_replace_messages_swaps_history() {
        let db = db();
        db.append_message("s1", Role::User, "antiga").unwrap();
        db.append_message("s1", Role::Assistant, "resposta antiga").unwrap();
        db.append_message("s2", Role::User, "outra").unwrap();

        let replacement = vec![
            NewMessage {
                role: Role::User,
                content: "nova pergunta".into(),
            },
            NewMessage {
                role: Role::Assistant,
                content: "nova resposta".into(),
            },
            NewMessage {
                role: Role::User,
                content: "e depois?".into(),
            },
        ];
        db.replace_messages("s1", &replacement).unwrap();

        let contents: Vec<String> = db
            .load_history("s1")
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["nova pergunta", "nova resposta", "e depois?"]);
        assert_eq!(db.load_history("s2").unwrap().len(), 1);

        db.replace_messages("s1", &[]).unwrap();
        assert!(db.get_session("s1").unwrap().unwrap().messages.is_empty());

        db.replace_messages("novo", &replacement[..1]).unwrap();
        assert_eq!(db.load_history("novo").unwrap()[0].content, "nova pergunta");
    }

    #[test]
    fn test_generate_session_id_batch_uniqueness() {
        let ids: Vec<String> = (0..100).map(|_| generate_session_id()).collect();
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len());
    }
}
