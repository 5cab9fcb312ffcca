//! Mock LLM client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::provider::{AdapterError, CompletionRequest, CompletionResponse, LlmClient, LlmUsage};

/// Mock implementation of the LlmClient trait.
///
/// Records every request and answers with a configurable text.
#[derive(Debug)]
pub struct MockLlmClient {
    provider: String,
    model: String,
    response: Arc<RwLock<String>>,
    next_error: Arc<RwLock<Option<AdapterError>>>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            response: Arc::new(RwLock::new("mock completion".to_string())),
            next_error: Arc::new(RwLock::new(None)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_response(&self, text: &str) {
        *self.response.write().await = text.to_string();
    }

    /// Fail the next completion with the given error.
    pub async fn fail_next(&self, error: AdapterError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AdapterError> {
        let input_tokens = request.prompt.split_whitespace().count() as u32;
        self.requests.write().await.push(request);

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let text = self.response.read().await.clone();
        Ok(CompletionResponse {
            usage: LlmUsage {
                input_tokens,
                output_tokens: text.split_whitespace().count() as u32,
            },
            text,
            model: self.model.clone(),
        })
    }
}
