use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        /// SHA-256 of the sanitized configuration
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Generation events
    GenerationCompleted {
        user_id: String,
        session_id: String,
        /// Model that served the request
        model: String,
        provider: String,
        /// Routing reason label (e.g. "keyword_image")
        reason: String,
        /// "text" or "image"
        kind: String,
        /// Whether the image fallback renderer produced the result
        fallback_used: bool,
    },
    GenerationFailed {
        user_id: String,
        session_id: String,
        reason: String,
        /// "configuration" or "provider"
        kind: String,
        error: String,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::GenerationCompleted { .. } => "generation_completed",
            Self::GenerationFailed { .. } => "generation_failed",
        }
    }

    /// Extract session_id if this event belongs to a chat session
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::GenerationCompleted { session_id, .. }
            | Self::GenerationFailed { session_id, .. } => Some(session_id),
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }

    /// Extract the acting user, if any
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::GenerationCompleted { user_id, .. } | Self::GenerationFailed { user_id, .. } => {
                Some(user_id)
            }
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}
