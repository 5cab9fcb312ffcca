use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::AuditEvent;

/// Envelope wrapping an audit event with the time it was emitted
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl AuditEventEnvelope {
    fn now(event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Handle for emitting audit events
///
/// Cheaply cloneable. Events go through a bounded channel to the
/// `AuditWriter`; a full or closed channel is logged and never fails the
/// caller, so auditing cannot break a chat request.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an event, waiting for channel capacity
    pub async fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.tx.send(AuditEventEnvelope::now(event)).await {
            tracing::error!("Failed to emit audit event: {}", e);
        }
    }

    /// Emit without waiting. Returns false if the event was dropped.
    pub fn try_emit(&self, event: AuditEvent) -> bool {
        match self.tx.try_send(AuditEventEnvelope::now(event)) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Dropped audit event: {}", e);
                false
            }
        }
    }
}
