//! The adapter capability shared by every backend.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::types::{AdapterDescriptor, AdapterKind, GenerationResult};

/// Errors an adapter can report after exhausting its own failure policy.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// A required credential is absent. Raised before any network I/O.
    #[error("{0} not set")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl AdapterError {
    /// Map a reqwest failure, recognizing timeouts.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout(timeout)
        } else if err.is_decode() {
            AdapterError::MalformedResponse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

/// A unit that talks to one generative backend and normalizes its output.
///
/// Adapters are built once at startup and shared read-only across requests.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Model and provider identity, used in the response envelope.
    fn descriptor(&self) -> &AdapterDescriptor;

    /// Category of result this adapter always returns.
    fn kind(&self) -> AdapterKind {
        self.descriptor().kind
    }

    /// Generate a result for the prompt. The prompt is passed with its original casing.
    async fn generate(&self, prompt: &str) -> Result<GenerationResult, AdapterError>;
}
