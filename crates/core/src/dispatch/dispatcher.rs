//! Request orchestration: route, invoke, translate errors.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::config::Config;
use crate::metrics::{ADAPTER_DURATION, ADAPTER_REQUESTS, ROUTING_DECISIONS};
use crate::provider::{Adapter, AdapterError, AdapterKind, ImageAdapter, TextAdapter};
use crate::routing::{ModeHint, PromptRouter};

use super::error::DispatchError;
use super::types::Dispatched;

/// Routes each request to exactly one adapter and normalizes the outcome.
///
/// Holds no per-request state; one instance is shared by all requests.
/// Text failures are fatal to the request; nothing falls back from text to
/// image.
pub struct Dispatcher {
    router: PromptRouter,
    text: Arc<dyn Adapter>,
    image: Arc<dyn Adapter>,
}

impl Dispatcher {
    /// Wire the router to one adapter per category.
    pub fn new(
        router: PromptRouter,
        text: Arc<dyn Adapter>,
        image: Arc<dyn Adapter>,
    ) -> Result<Self, DispatchError> {
        for (slot, adapter) in [(AdapterKind::Text, &text), (AdapterKind::Image, &image)] {
            if adapter.kind() != slot {
                return Err(DispatchError::Configuration(format!(
                    "{} adapter '{}' registered in the {} slot",
                    adapter.kind(),
                    adapter.descriptor().name,
                    slot
                )));
            }
        }

        Ok(Self {
            router,
            text,
            image,
        })
    }

    /// Build the production adapters and router from configuration.
    pub fn from_config(config: &Config) -> Result<Self, DispatchError> {
        let text = TextAdapter::from_config(&config.providers.text)
            .map_err(|e| DispatchError::Configuration(format!("text adapter: {}", e)))?;
        let image = ImageAdapter::from_config(&config.providers.image)
            .map_err(|e| DispatchError::Configuration(format!("image adapter: {}", e)))?;

        Self::new(
            PromptRouter::from_config(&config.routing),
            Arc::new(text),
            Arc::new(image),
        )
    }

    pub fn router(&self) -> &PromptRouter {
        &self.router
    }

    pub fn adapter(&self, kind: AdapterKind) -> &Arc<dyn Adapter> {
        match kind {
            AdapterKind::Text => &self.text,
            AdapterKind::Image => &self.image,
        }
    }

    /// Route the prompt, invoke the chosen adapter and return its result
    /// with the routing decision.
    pub async fn handle(&self, prompt: &str, mode: ModeHint) -> Result<Dispatched, DispatchError> {
        let decision = self.router.route(prompt, mode);
        ROUTING_DECISIONS
            .with_label_values(&[decision.reason.as_str()])
            .inc();

        let adapter = self.adapter(decision.target);
        let descriptor = adapter.descriptor().clone();
        info!(
            reason = %decision.reason,
            model = %descriptor.name,
            provider = %descriptor.provider,
            "Dispatching prompt"
        );

        let start = Instant::now();
        let outcome = adapter.generate(prompt).await;
        ADAPTER_DURATION
            .with_label_values(&[&descriptor.provider])
            .observe(start.elapsed().as_secs_f64());

        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                ADAPTER_REQUESTS
                    .with_label_values(&[&descriptor.provider, "failure"])
                    .inc();
                error!(
                    provider = %descriptor.provider,
                    adapter = %descriptor.kind,
                    "Generation failed: {}",
                    e
                );
                // Only a missing text credential is fatal to the service.
                return Err(match e {
                    AdapterError::NotConfigured(_) if descriptor.kind == AdapterKind::Text => {
                        DispatchError::Configuration(e.to_string())
                    }
                    other => DispatchError::Provider {
                        adapter: descriptor.kind,
                        provider: descriptor.provider,
                        message: other.to_string(),
                    },
                });
            }
        };

        if output.kind() != descriptor.kind {
            ADAPTER_REQUESTS
                .with_label_values(&[&descriptor.provider, "failure"])
                .inc();
            return Err(DispatchError::Provider {
                adapter: descriptor.kind,
                message: format!("adapter returned a {} result", output.kind()),
                provider: descriptor.provider,
            });
        }

        let result = if output.used_fallback() {
            "fallback"
        } else {
            "success"
        };
        ADAPTER_REQUESTS
            .with_label_values(&[&descriptor.provider, result])
            .inc();

        Ok(Dispatched {
            adapter: descriptor,
            decision,
            output,
        })
    }
}
