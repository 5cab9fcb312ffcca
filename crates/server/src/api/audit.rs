use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use nexus_core::{AuditFilter, AuditRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQueryParams {
    pub session_id: Option<String>,
    /// e.g. "generation_completed"
    pub event_type: Option<String>,
    pub user_id: Option<String>,
    /// RFC 3339 lower bound
    pub from: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQueryParams {
    fn filter(&self) -> AuditFilter {
        let mut filter = AuditFilter::new().with_page(self.limit, self.offset);
        if let Some(ref session_id) = self.session_id {
            filter = filter.with_session_id(session_id);
        }
        if let Some(ref event_type) = self.event_type {
            filter = filter.with_event_type(event_type);
        }
        if let Some(ref user_id) = self.user_id {
            filter = filter.with_user_id(user_id);
        }
        if self.from.is_some() || self.to.is_some() {
            filter = filter.with_time_range(self.from, self.to);
        }
        filter
    }
}

#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    pub events: Vec<AuditRecord>,
    /// Matching events ignoring pagination
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Query audit events, newest first
pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditQueryResponse>, ApiError> {
    let filter = params.filter();

    let events = state
        .audit_store()
        .query(&filter)
        .map_err(|e| ApiError::Internal(format!("Failed to query audit events: {}", e)))?;
    let total = state
        .audit_store()
        .count(&filter)
        .map_err(|e| ApiError::Internal(format!("Failed to count audit events: {}", e)))?;

    Ok(Json(AuditQueryResponse {
        events,
        total,
        limit: filter.limit,
        offset: filter.offset,
    }))
}
