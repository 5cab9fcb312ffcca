//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nexus_core::{DispatchError, HistoryError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    /// Adapter category that failed: "text" or "image"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
}

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Dispatch(DispatchError),
    Internal(String),
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::Dispatch(err)
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::SessionNotFound(id) => {
                ApiError::NotFound(format!("Session not found: {}", id))
            }
            HistoryError::Database(e) => ApiError::Internal(format!("History error: {}", e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error,
                    kind: None,
                    source: None,
                },
            ),
            ApiError::NotFound(error) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error,
                    kind: None,
                    source: None,
                },
            ),
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error,
                    kind: None,
                    source: None,
                },
            ),
            ApiError::Dispatch(err) => {
                let status = match err {
                    DispatchError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    DispatchError::Provider { .. } => StatusCode::BAD_GATEWAY,
                };
                (
                    status,
                    ErrorResponse {
                        error: err.to_string(),
                        kind: Some(err.kind()),
                        source: err.adapter().map(|kind| kind.as_str()),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
