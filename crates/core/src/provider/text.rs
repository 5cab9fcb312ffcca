//! Text adapter: one upstream chat completion per request, no retry, no fallback.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{is_configured, TextProviderConfig};
use crate::metrics::LLM_TOKENS;

use super::llm::{CompletionRequest, LlmClient, OpenAiCompatibleClient};
use super::traits::{Adapter, AdapterError};
use super::types::{AdapterDescriptor, AdapterKind, GenerationResult};

/// Name reported when the text credential is missing.
pub const TEXT_CREDENTIAL: &str = "GROQ_API_KEY";

/// Adapter serving both plain-text and code prompts.
pub struct TextAdapter {
    descriptor: AdapterDescriptor,
    client: Option<Arc<dyn LlmClient>>,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

impl TextAdapter {
    /// Build from configuration. A missing credential is not an error here;
    /// it is reported by `generate` before any network call.
    pub fn from_config(config: &TextProviderConfig) -> Result<Self, AdapterError> {
        let client: Option<Arc<dyn LlmClient>> = match &config.api_key {
            Some(api_key) if is_configured(&config.api_key) => {
                Some(Arc::new(OpenAiCompatibleClient::new(
                    config.provider.clone(),
                    api_key.clone(),
                    config.model.clone(),
                    config.api_base.clone(),
                    Duration::from_secs(config.timeout_secs),
                    Duration::from_secs(config.connect_timeout_secs),
                )?))
            }
            _ => None,
        };

        Ok(Self {
            descriptor: AdapterDescriptor::new(&config.model, &config.provider, AdapterKind::Text),
            client,
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Build around an existing client, using its provider and model identity.
    pub fn with_client(client: Arc<dyn LlmClient>, config: &TextProviderConfig) -> Self {
        Self {
            descriptor: AdapterDescriptor::new(client.model(), client.provider(), AdapterKind::Text),
            client: Some(client),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Whether a credential was supplied at startup.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl Adapter for TextAdapter {
    fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult, AdapterError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AdapterError::NotConfigured(TEXT_CREDENTIAL.to_string()))?;

        let request = CompletionRequest::new(prompt)
            .with_system(&self.system_prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = client.complete(request).await?;
        LLM_TOKENS
            .with_label_values(&[client.provider(), "input"])
            .inc_by(response.usage.input_tokens as u64);
        LLM_TOKENS
            .with_label_values(&[client.provider(), "output"])
            .inc_by(response.usage.output_tokens as u64);
        debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Text completion finished"
        );

        Ok(GenerationResult::text(response.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlmClient;

    #[tokio::test]
    async fn test_missing_credential_fails_fast() {
        let adapter = TextAdapter::from_config(&TextProviderConfig::default()).unwrap();
        assert!(!adapter.is_configured());

        let err = adapter.generate("hello").await.unwrap_err();
        assert!(matches!(err, AdapterError::NotConfigured(ref name) if name == TEXT_CREDENTIAL));
    }

    #[tokio::test]
    async fn test_blank_credential_counts_as_missing() {
        let config = TextProviderConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        let adapter = TextAdapter::from_config(&config).unwrap();
        assert!(!adapter.is_configured());
    }

    #[test]
    fn test_descriptor_from_config() {
        let config = TextProviderConfig {
            api_key: Some("gsk-1".to_string()),
            ..Default::default()
        };
        let adapter = TextAdapter::from_config(&config).unwrap();
        assert!(adapter.is_configured());
        assert_eq!(adapter.descriptor().name, "llama-3.3-70b-versatile");
        assert_eq!(adapter.descriptor().provider, "groq");
        assert_eq!(adapter.kind(), AdapterKind::Text);
    }

    #[tokio::test]
    async fn test_generate_sends_framed_request() {
        let client = Arc::new(MockLlmClient::new("groq", "llama-test"));
        client.set_response("42").await;
        let adapter = TextAdapter::with_client(client.clone(), &TextProviderConfig::default());

        let result = adapter.generate("What Is The Answer?").await.unwrap();
        assert_eq!(result, GenerationResult::text("42"));

        let requests = client.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "What Is The Answer?");
        assert_eq!(
            requests[0].system.as_deref(),
            Some("You are a helpful AI assistant.")
        );
        assert_eq!(requests[0].temperature, 0.7);
        assert_eq!(requests[0].max_tokens, 1024);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates_unchanged() {
        let client = Arc::new(MockLlmClient::new("groq", "llama-test"));
        client
            .fail_next(AdapterError::Api {
                status: 429,
                message: "rate limited".to_string(),
            })
            .await;
        let adapter = TextAdapter::with_client(client.clone(), &TextProviderConfig::default());

        let err = adapter.generate("hi").await.unwrap_err();
        assert!(matches!(err, AdapterError::Api { status: 429, .. }));
        assert_eq!(client.recorded_requests().await.len(), 1);
    }
}
