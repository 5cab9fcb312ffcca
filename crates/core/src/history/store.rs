use thiserror::Error;

use super::{ChatSession, Exchange, NewExchange};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),

    /// The session exists but belongs to someone else. Reported as not
    /// found so session ids cannot be probed.
    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl From<rusqlite::Error> for HistoryError {
    fn from(err: rusqlite::Error) -> Self {
        HistoryError::Database(err.to_string())
    }
}

/// Per-user chat session storage
pub trait HistoryStore: Send + Sync {
    /// Whether `user_id` may append to `session_id`: the session is theirs
    /// or does not exist yet. Cheap enough to call before generating.
    fn can_write(&self, user_id: &str, session_id: &str) -> Result<bool, HistoryError>;

    /// Append an exchange, creating the session on first use.
    fn record_exchange(
        &self,
        user_id: &str,
        session_id: &str,
        exchange: &NewExchange,
    ) -> Result<Exchange, HistoryError>;

    /// The user's sessions, most recently updated first.
    fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, HistoryError>;

    /// Exchanges of one session, oldest first. `None` when the session does
    /// not exist or belongs to another user.
    fn session_history(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Vec<Exchange>>, HistoryError>;
}
