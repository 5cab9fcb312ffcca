//! Adapter selection.

use tracing::debug;

use crate::config::RoutingConfig;
use crate::provider::AdapterKind;

use super::classifier::KeywordClassifier;
use super::types::{Classification, ModeHint, RoutingDecision, RoutingReason};

/// Picks exactly one adapter category per request.
///
/// Selection depends only on the prompt, the mode hint and the configured
/// keyword sets. Code prompts go to the text adapter: a single text backend
/// serves both plain text and code.
#[derive(Debug, Clone, Default)]
pub struct PromptRouter {
    classifier: KeywordClassifier,
}

impl PromptRouter {
    pub fn new(classifier: KeywordClassifier) -> Self {
        Self { classifier }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(KeywordClassifier::from_config(config))
    }

    pub fn classifier(&self) -> &KeywordClassifier {
        &self.classifier
    }

    /// Resolve a request. First match wins: explicit hints, then image
    /// keywords, then the text default. Never fails.
    pub fn route(&self, prompt: &str, mode: ModeHint) -> RoutingDecision {
        let classification = self.classifier.classify(prompt);

        let (target, reason) = match (mode, classification) {
            (ModeHint::Image, _) => (AdapterKind::Image, RoutingReason::UserHintImage),
            (ModeHint::Text, _) => (AdapterKind::Text, RoutingReason::UserHintText),
            (ModeHint::Auto, Classification::Image) => {
                (AdapterKind::Image, RoutingReason::KeywordImage)
            }
            (ModeHint::Auto, _) => (AdapterKind::Text, RoutingReason::DefaultText),
        };

        debug!(?mode, ?classification, %reason, "Routed prompt");

        RoutingDecision {
            target,
            reason,
            classification,
        }
    }
}
