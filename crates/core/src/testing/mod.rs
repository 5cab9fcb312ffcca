//! Testing utilities and mock implementations.
//!
//! The mocks stand in for upstream providers so routing, dispatch and the
//! HTTP layer can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use nexus_core::testing::{MockAdapter, fixtures};
//!
//! let text = Arc::new(MockAdapter::text());
//! let image = Arc::new(MockAdapter::image());
//! let dispatcher = Dispatcher::new(PromptRouter::default(), text.clone(), image.clone())?;
//! ```

mod mock_adapter;
mod mock_llm;

pub use mock_adapter::{MockAdapter, RecordedGeneration};
pub use mock_llm::MockLlmClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{Config, ImageProviderConfig, TextProviderConfig};

    /// Configuration with both credentials set and upstreams pointed at `base`.
    pub fn config_with_upstream(base: &str) -> Config {
        let mut config = Config::default();
        config.providers.text = TextProviderConfig {
            api_key: Some("test-text-key".to_string()),
            api_base: format!("{}/openai/v1", base),
            timeout_secs: 5,
            connect_timeout_secs: 1,
            ..Default::default()
        };
        config.providers.image = ImageProviderConfig {
            api_key: Some("test-image-key".to_string()),
            api_base: format!("{}/v1beta", base),
            fallback_url: format!("{}/prompt", base),
            timeout_secs: 2,
            connect_timeout_secs: 1,
            ..Default::default()
        };
        config
    }

    /// A prompt long enough to exercise session-title truncation.
    pub fn long_prompt() -> String {
        "Explain in detail how a compiler turns source code into machine instructions".to_string()
    }
}
