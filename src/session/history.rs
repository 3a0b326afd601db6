//! History-backed session adapter: one persisted chat log per session id,
//! read by the capability router as prior-turn context and extended with
//! both turns after each completed exchange.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{Message, MessageRole};

/// Per-session chat history. Logs are auto-created on first access and
/// never shared between session ids.
pub trait ChatHistory: Send + Sync {
    /// Prior turns for a session, oldest first. An unknown session id is
    /// an empty, freshly created log.
    fn turns(&self, session_id: &str) -> Result<Vec<Message>, DatabaseError>;

    /// Record a completed exchange — user turn then assistant turn — so
    /// subsequent turns see full history.
    fn append_exchange(
        &self,
        session_id: &str,
        user: &str,
        assistant: &str,
    ) -> Result<(), DatabaseError>;
}

/// SQLite-backed history store.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl ChatHistory for SqliteHistoryStore {
    fn turns(&self, session_id: &str) -> Result<Vec<Message>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT role, content FROM session_messages
             WHERE session_id = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![session_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content) = row?;
            messages.push(Message {
                role: MessageRole::from_str(&role)?,
                content,
            });
        }
        Ok(messages)
    }

    fn append_exchange(
        &self,
        session_id: &str,
        user: &str,
        assistant: &str,
    ) -> Result<(), DatabaseError> {
        let mut conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO session_messages (session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, MessageRole::User.as_str(), user, now],
        )?;
        tx.execute(
            "INSERT INTO session_messages (session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, MessageRole::Assistant.as_str(), assistant, now],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// In-memory history for tests.
#[derive(Default)]
pub struct InMemoryHistory {
    logs: Mutex<HashMap<String, Vec<Message>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatHistory for InMemoryHistory {
    fn turns(&self, session_id: &str) -> Result<Vec<Message>, DatabaseError> {
        let logs = self.logs.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(logs.get(session_id).cloned().unwrap_or_default())
    }

    fn append_exchange(
        &self,
        session_id: &str,
        user: &str,
        assistant: &str,
    ) -> Result<(), DatabaseError> {
        let mut logs = self.logs.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let log = logs.entry(session_id.to_string()).or_default();
        log.push(Message::user(user));
        log.push(Message::assistant(assistant));
        Ok(())
    }
}
