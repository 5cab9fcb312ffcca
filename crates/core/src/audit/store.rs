use chrono::{DateTime, Utc};
use thiserror::Error;

use super::AuditRecord;

/// Page size when the caller does not ask for one.
pub const DEFAULT_AUDIT_PAGE: i64 = 100;

/// Upper bound on a single page.
pub const MAX_AUDIT_PAGE: i64 = 1000;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit database error: {0}")]
    Database(String),

    #[error("Audit event could not be encoded: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for AuditError {
    fn from(err: rusqlite::Error) -> Self {
        AuditError::Database(err.to_string())
    }
}

/// Which audit records to return. Every criterion is optional and they
/// combine with AND; results come back newest first.
#[derive(Debug, Clone)]
pub struct AuditFilter {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    /// Snake-case event name, e.g. "generation_failed"
    pub event_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditFilter {
    pub fn new() -> Self {
        Self {
            session_id: None,
            user_id: None,
            event_type: None,
            from: None,
            to: None,
            limit: DEFAULT_AUDIT_PAGE,
            offset: 0,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_time_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Set paging from untrusted input. The limit is clamped to
    /// `1..=MAX_AUDIT_PAGE` and negative offsets become 0.
    pub fn with_page(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        self.limit = limit.unwrap_or(DEFAULT_AUDIT_PAGE).clamp(1, MAX_AUDIT_PAGE);
        self.offset = offset.unwrap_or(0).max(0);
        self
    }
}

/// Persistence for the audit trail. Called only from the writer task and
/// the query endpoint, so implementations may block.
pub trait AuditStore: Send + Sync {
    /// Persist one record and return its row id.
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError>;

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError>;

    /// Matching records, ignoring `limit` and `offset`.
    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError>;
}
