use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ToSql};

use super::{AuditError, AuditEvent, AuditFilter, AuditRecord, AuditStore};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS audit_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        event_type TEXT NOT NULL,
        session_id TEXT,
        user_id TEXT,
        data TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_audit_events_timestamp ON audit_events(timestamp);
    CREATE INDEX IF NOT EXISTS idx_audit_events_session_id ON audit_events(session_id);
    CREATE INDEX IF NOT EXISTS idx_audit_events_event_type ON audit_events(event_type);
    CREATE INDEX IF NOT EXISTS idx_audit_events_user_id ON audit_events(user_id);
"#;

/// SQLite-backed audit store
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// Open (or create) the database file and ensure the schema exists
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create an in-memory store (useful for testing)
    pub fn in_memory() -> Result<Self, AuditError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AuditError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, AuditError> {
        self.conn
            .lock()
            .map_err(|_| AuditError::Database("audit connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &AuditFilter) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref session_id) = filter.session_id {
            conditions.push("session_id = ?");
            params.push(Box::new(session_id.clone()));
        }
        if let Some(ref event_type) = filter.event_type {
            conditions.push("event_type = ?");
            params.push(Box::new(event_type.clone()));
        }
        if let Some(ref user_id) = filter.user_id {
            conditions.push("user_id = ?");
            params.push(Box::new(user_id.clone()));
        }
        if let Some(ref from) = filter.from {
            conditions.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339_opts(SecondsFormat::Micros, true)));
        }
        if let Some(ref to) = filter.to {
            conditions.push("timestamp <= ?");
            params.push(Box::new(to.to_rfc3339_opts(SecondsFormat::Micros, true)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let data_json = serde_json::to_string(&record.data)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO audit_events (timestamp, event_type, session_id, user_id, data) VALUES (?, ?, ?, ?, ?)",
            params![
                record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                record.event_type,
                record.session_id,
                record.user_id,
                data_json,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let (where_clause, mut params) = Self::build_where_clause(filter);
        params.push(Box::new(filter.limit));
        params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let sql = format!(
            "SELECT id, timestamp, event_type, session_id, user_id, data FROM audit_events {} \
             ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, timestamp, event_type, session_id, user_id, data_json) = row?;

            let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| AuditError::Database(format!("Invalid timestamp: {}", e)))?
                .into();
            let data: AuditEvent = serde_json::from_str(&data_json)
                .map_err(|e| AuditError::Serialization(e.to_string()))?;

            records.push(AuditRecord {
                id,
                timestamp,
                event_type,
                session_id,
                user_id,
                data,
            });
        }

        Ok(records)
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        let (where_clause, params) = Self::build_where_clause(filter);
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let sql = format!("SELECT COUNT(*) FROM audit_events {}", where_clause);

        let conn = self.conn()?;
        let count = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(event: AuditEvent) -> AuditRecord {
        AuditRecord {
            id: 0,
            timestamp: Utc::now(),
            event_type: event.event_type().to_string(),
            session_id: event.session_id().map(String::from),
            user_id: event.user_id().map(String::from),
            data: event,
        }
    }

    fn started() -> AuditRecord {
        record(AuditEvent::ServiceStarted {
            version: "0.1.0".to_string(),
            config_hash: "abc123".to_string(),
        })
    }

    fn completed(session_id: &str, user_id: &str) -> AuditRecord {
        record(AuditEvent::GenerationCompleted {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            model: "mock-text".to_string(),
            provider: "mock".to_string(),
            reason: "default_text".to_string(),
            kind: "text".to_string(),
            fallback_used: false,
        })
    }

    #[test]
    fn test_insert_and_query() {
        let store = SqliteAuditStore::in_memory().unwrap();
        let id = store.insert(&started()).unwrap();
        assert!(id > 0);

        let results = store.query(&AuditFilter::new()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id);
        assert_eq!(results[0].event_type, "service_started");
        assert_eq!(results[0].data, started().data);
    }

    #[test]
    fn test_filters() {
        let store = SqliteAuditStore::in_memory().unwrap();
        store.insert(&started()).unwrap();
        store.insert(&completed("s-1", "alice")).unwrap();
        store.insert(&completed("s-2", "alice")).unwrap();
        store.insert(&completed("s-3", "bob")).unwrap();

        let by_type = AuditFilter::new().with_event_type("generation_completed");
        assert_eq!(store.query(&by_type).unwrap().len(), 3);

        let by_session = AuditFilter::new().with_session_id("s-2");
        let results = store.query(&by_session).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].session_id.as_deref(), Some("s-2"));

        let by_user = AuditFilter::new().with_user_id("alice");
        assert_eq!(store.count(&by_user).unwrap(), 2);
        assert_eq!(store.count(&AuditFilter::new()).unwrap(), 4);
    }

    #[test]
    fn test_newest_first_and_time_range() {
        let store = SqliteAuditStore::in_memory().unwrap();
        let now = Utc::now();

        let mut old = completed("old", "alice");
        old.timestamp = now - Duration::hours(2);
        store.insert(&old).unwrap();
        let mut new = completed("new", "alice");
        new.timestamp = now;
        store.insert(&new).unwrap();

        let results = store.query(&AuditFilter::new()).unwrap();
        assert_eq!(results[0].session_id.as_deref(), Some("new"));

        let recent = AuditFilter::new().with_time_range(Some(now - Duration::hours(1)), None);
        let results = store.query(&recent).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].session_id.as_deref(), Some("new"));
    }

    #[test]
    fn test_pagination() {
        let store = SqliteAuditStore::in_memory().unwrap();
        for i in 0..5 {
            store.insert(&completed(&format!("s-{}", i), "alice")).unwrap();
        }

        let page = |offset| {
            store
                .query(&AuditFilter::new().with_page(Some(2), Some(offset)))
                .unwrap()
                .len()
        };
        assert_eq!(page(0), 2);
        assert_eq!(page(2), 2);
        assert_eq!(page(4), 1);
    }

    #[test]
    fn test_file_based_store_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("audit.db");

        {
            let store = SqliteAuditStore::new(&db_path).unwrap();
            store.insert(&started()).unwrap();
        }
        assert!(db_path.exists());

        let reopened = SqliteAuditStore::new(&db_path).unwrap();
        assert_eq!(reopened.count(&AuditFilter::new()).unwrap(), 1);
    }
}
