//! Mock adapter for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::provider::{Adapter, AdapterDescriptor, AdapterError, AdapterKind, GenerationResult};

/// A recorded generate call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedGeneration {
    /// Prompt exactly as the adapter received it.
    pub prompt: String,
    /// When the call was made.
    pub timestamp: Instant,
}

/// Mock implementation of the Adapter trait.
///
/// Provides controllable behavior for testing:
/// - Return a canned result, or one derived from the prompt
/// - Track prompts for assertions
/// - Simulate failures and slow upstreams
///
/// # Example
///
/// ```rust,ignore
/// use nexus_core::testing::MockAdapter;
///
/// let text = MockAdapter::text();
/// text.set_result(GenerationResult::text("hello")).await;
///
/// let result = text.generate("say hi").await?;
/// assert_eq!(text.recorded_prompts().await, vec!["say hi"]);
/// ```
#[derive(Debug)]
pub struct MockAdapter {
    descriptor: AdapterDescriptor,
    /// Fixed result; when unset the result echoes the prompt.
    result: Arc<RwLock<Option<GenerationResult>>>,
    /// If set, the next call fails with this error.
    next_error: Arc<RwLock<Option<AdapterError>>>,
    /// If set, every call fails with this error.
    persistent_error: Arc<RwLock<Option<AdapterError>>>,
    /// Simulated upstream latency.
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<RwLock<Vec<RecordedGeneration>>>,
}

impl MockAdapter {
    pub fn new(descriptor: AdapterDescriptor) -> Self {
        Self {
            descriptor,
            result: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
            persistent_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Text adapter named `mock-text` from provider `mock`.
    pub fn text() -> Self {
        Self::new(AdapterDescriptor::new("mock-text", "mock", AdapterKind::Text))
    }

    /// Image adapter named `mock-image` from provider `mock`.
    pub fn image() -> Self {
        Self::new(AdapterDescriptor::new("mock-image", "mock", AdapterKind::Image))
    }

    /// Return this result for every subsequent call.
    pub async fn set_result(&self, result: GenerationResult) {
        *self.result.write().await = Some(result);
    }

    /// Fail the next call with the given error.
    pub async fn fail_next(&self, error: AdapterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every call until cleared.
    pub async fn fail_always(&self, error: AdapterError) {
        *self.persistent_error.write().await = Some(error);
    }

    pub async fn clear_failures(&self) {
        *self.next_error.write().await = None;
        *self.persistent_error.write().await = None;
    }

    /// Sleep this long inside every call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedGeneration> {
        self.calls.read().await.clone()
    }

    pub async fn recorded_prompts(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|c| c.prompt.clone())
            .collect()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    fn echo(&self, prompt: &str) -> GenerationResult {
        match self.descriptor.kind {
            AdapterKind::Text => GenerationResult::text(format!("mock answer: {}", prompt)),
            AdapterKind::Image => GenerationResult::image(format!(
                "https://mock.invalid/image/{}",
                urlencoding::encode(prompt)
            )),
        }
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult, AdapterError> {
        self.calls.write().await.push(RecordedGeneration {
            prompt: prompt.to_string(),
            timestamp: Instant::now(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(err) = self.persistent_error.read().await.clone() {
            return Err(err);
        }

        let result = self.result.read().await.clone();
        Ok(result.unwrap_or_else(|| self.echo(prompt)))
    }
}
