//! The chat endpoint: route a prompt, record the exchange, return the envelope.

use axum::{extract::State, Json};
use nexus_core::{AuditEvent, Dispatched, HistoryError, ModeHint, NewExchange, ResponseEnvelope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::error::ApiError;
use super::middleware::AuthUser;
use crate::metrics::CHAT_REQUESTS_TOTAL;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    /// "auto", "text" or "image"; anything else means auto
    #[serde(default)]
    pub mode: Option<ModeHint>,
    /// Continue an existing session; a new one is created when absent
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub envelope: ResponseEnvelope,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        CHAT_REQUESTS_TOTAL.with_label_values(&["invalid"]).inc();
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let mode = request.mode.unwrap_or_default();
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    // Routing is pure; every audit event below reuses this reason.
    let reason = state
        .dispatcher()
        .router()
        .route(&request.prompt, mode)
        .reason
        .as_str();

    // Refuse foreign sessions before paying for a generation.
    match state.history().can_write(&user_id, &session_id) {
        Ok(true) => {}
        Ok(false) => {
            CHAT_REQUESTS_TOTAL
                .with_label_values(&["session_not_found"])
                .inc();
            warn!(user_id = %user_id, session_id = %session_id, "Write to foreign session refused");
            let error = format!("Session not found: {}", session_id);
            state
                .audit()
                .emit(failed_event(&user_id, &session_id, reason, "session_not_found", &error))
                .await;
            return Err(ApiError::NotFound(error));
        }
        Err(e) => {
            return Err(history_failure(&state, &user_id, &session_id, reason, e).await);
        }
    }

    let dispatched = match state.dispatcher().handle(&request.prompt, mode).await {
        Ok(dispatched) => dispatched,
        Err(err) => {
            let outcome = match err.kind() {
                "configuration" => "configuration_error",
                _ => "provider_error",
            };
            CHAT_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
            state
                .audit()
                .emit(failed_event(
                    &user_id,
                    &session_id,
                    reason,
                    err.kind(),
                    &err.to_string(),
                ))
                .await;
            return Err(err.into());
        }
    };

    let exchange = NewExchange::from_dispatched(&request.prompt, &dispatched);
    if let Err(e) = state
        .history()
        .record_exchange(&user_id, &session_id, &exchange)
    {
        return Err(history_failure(&state, &user_id, &session_id, reason, e).await);
    }

    CHAT_REQUESTS_TOTAL
        .with_label_values(&[dispatched.output.kind().as_str()])
        .inc();
    state
        .audit()
        .emit(completed_event(&user_id, &session_id, &dispatched))
        .await;
    info!(
        user_id = %user_id,
        session_id = %session_id,
        reason = %dispatched.decision.reason,
        "Chat request served"
    );

    Ok(Json(ChatResponse {
        session_id,
        envelope: dispatched.envelope(),
    }))
}

/// Count, log and audit a history store failure, then convert it.
async fn history_failure(
    state: &AppState,
    user_id: &str,
    session_id: &str,
    reason: &str,
    err: HistoryError,
) -> ApiError {
    let (outcome, kind) = match err {
        HistoryError::SessionNotFound(_) => ("session_not_found", "session_not_found"),
        HistoryError::Database(_) => ("history_error", "history"),
    };
    CHAT_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    error!(session_id = %session_id, "History store rejected exchange: {}", err);
    state
        .audit()
        .emit(failed_event(user_id, session_id, reason, kind, &err.to_string()))
        .await;
    err.into()
}

fn failed_event(
    user_id: &str,
    session_id: &str,
    reason: &str,
    kind: &str,
    error: &str,
) -> AuditEvent {
    AuditEvent::GenerationFailed {
        user_id: user_id.to_string(),
        session_id: session_id.to_string(),
        reason: reason.to_string(),
        kind: kind.to_string(),
        error: error.to_string(),
    }
}

fn completed_event(user_id: &str, session_id: &str, dispatched: &Dispatched) -> AuditEvent {
    AuditEvent::GenerationCompleted {
        user_id: user_id.to_string(),
        session_id: session_id.to_string(),
        model: dispatched.adapter.name.clone(),
        provider: dispatched.adapter.provider.clone(),
        reason: dispatched.decision.reason.as_str().to_string(),
        kind: dispatched.output.kind().as_str().to_string(),
        fallback_used: dispatched.output.used_fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: ChatRequest = serde_json::from_str(r#"{"prompt":"hi"}"#).unwrap();
        assert_eq!(request.mode.unwrap_or_default(), ModeHint::Auto);
        assert!(request.session_id.is_none());
    }

    #[test]
    fn test_unknown_mode_means_auto() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"prompt":"hi","mode":"video"}"#).unwrap();
        assert_eq!(request.mode, Some(ModeHint::Auto));

        let request: ChatRequest =
            serde_json::from_str(r#"{"prompt":"hi","mode":"image","session_id":"s-1"}"#).unwrap();
        assert_eq!(request.mode, Some(ModeHint::Image));
        assert_eq!(request.session_id.as_deref(), Some("s-1"));
    }
}
