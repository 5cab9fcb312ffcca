use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{session_title, ChatSession, Exchange, HistoryError, HistoryStore, NewExchange};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chat_sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chat_exchanges (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL REFERENCES chat_sessions(id),
        prompt TEXT NOT NULL,
        response TEXT NOT NULL,
        kind TEXT NOT NULL,
        model TEXT NOT NULL,
        provider TEXT NOT NULL,
        reason TEXT NOT NULL,
        fallback_used INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chat_sessions_user_id ON chat_sessions(user_id);
    CREATE INDEX IF NOT EXISTS idx_chat_exchanges_session_id ON chat_exchanges(session_id);
"#;

/// SQLite-backed chat history
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn new(path: &Path) -> Result<Self, HistoryError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.conn
            .lock()
            .map_err(|_| HistoryError::Database("history connection lock poisoned".to_string()))
    }

    fn session_owner(conn: &Connection, session_id: &str) -> Result<Option<String>, HistoryError> {
        let owner = conn
            .query_row(
                "SELECT user_id FROM chat_sessions WHERE id = ?",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner)
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn stamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(Into::into)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<ChatSession> {
    Ok(ChatSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        created_at: parse_timestamp(&row.get::<_, String>(3)?)?,
        updated_at: parse_timestamp(&row.get::<_, String>(4)?)?,
    })
}

fn exchange_from_row(row: &Row<'_>) -> rusqlite::Result<Exchange> {
    Ok(Exchange {
        id: row.get(0)?,
        session_id: row.get(1)?,
        prompt: row.get(2)?,
        response: row.get(3)?,
        kind: row.get(4)?,
        model: row.get(5)?,
        provider: row.get(6)?,
        reason: row.get(7)?,
        fallback_used: row.get(8)?,
        created_at: parse_timestamp(&row.get::<_, String>(9)?)?,
    })
}

impl HistoryStore for SqliteHistoryStore {
    fn can_write(&self, user_id: &str, session_id: &str) -> Result<bool, HistoryError> {
        let conn = self.conn()?;
        Ok(Self::session_owner(&conn, session_id)?.map_or(true, |owner| owner == user_id))
    }

    fn record_exchange(
        &self,
        user_id: &str,
        session_id: &str,
        exchange: &NewExchange,
    ) -> Result<Exchange, HistoryError> {
        let now = Utc::now();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        match Self::session_owner(&tx, session_id)? {
            Some(owner) if owner != user_id => {
                return Err(HistoryError::SessionNotFound(session_id.to_string()));
            }
            Some(_) => {
                tx.execute(
                    "UPDATE chat_sessions SET updated_at = ? WHERE id = ?",
                    params![stamp(&now), session_id],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                    params![
                        session_id,
                        user_id,
                        session_title(&exchange.prompt),
                        stamp(&now),
                        stamp(&now),
                    ],
                )?;
            }
        }

        tx.execute(
            "INSERT INTO chat_exchanges (session_id, prompt, response, kind, model, provider, reason, fallback_used, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                session_id,
                exchange.prompt,
                exchange.response,
                exchange.kind,
                exchange.model,
                exchange.provider,
                exchange.reason,
                exchange.fallback_used,
                stamp(&now),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Exchange {
            id,
            session_id: session_id.to_string(),
            prompt: exchange.prompt.clone(),
            response: exchange.response.clone(),
            kind: exchange.kind.clone(),
            model: exchange.model.clone(),
            provider: exchange.provider.clone(),
            reason: exchange.reason.clone(),
            fallback_used: exchange.fallback_used,
            created_at: now,
        })
    }

    fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, HistoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, created_at, updated_at FROM chat_sessions \
             WHERE user_id = ? ORDER BY updated_at DESC, rowid DESC",
        )?;
        let sessions = stmt
            .query_map(params![user_id], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn session_history(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Vec<Exchange>>, HistoryError> {
        let conn = self.conn()?;
        if Self::session_owner(&conn, session_id)?.as_deref() != Some(user_id) {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT id, session_id, prompt, response, kind, model, provider, reason, fallback_used, created_at \
             FROM chat_exchanges WHERE session_id = ? ORDER BY id ASC",
        )?;
        let exchanges = stmt
            .query_map(params![session_id], exchange_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(exchanges))
    }
}
