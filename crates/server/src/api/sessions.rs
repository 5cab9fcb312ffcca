use axum::{
    extract::{Path, State},
    Json,
};
use nexus_core::{ChatSession, Exchange};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use super::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<ChatSession>,
}

#[derive(Debug, Serialize)]
pub struct SessionHistoryResponse {
    pub session_id: String,
    pub exchanges: Vec<Exchange>,
}

/// Caller's sessions, most recent first.
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.history().list_sessions(&user_id)?;
    Ok(Json(SessionListResponse { sessions }))
}

/// Exchanges of one of the caller's sessions, oldest first.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<SessionHistoryResponse>, ApiError> {
    let exchanges = state
        .history()
        .session_history(&user_id, &session_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))?;

    Ok(Json(SessionHistoryResponse {
        session_id,
        exchanges,
    }))
}
