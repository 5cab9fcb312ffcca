use serde::Serialize;

use crate::provider::{AdapterDescriptor, GenerationResult};
use crate::routing::RoutingDecision;

/// A successful dispatch: which adapter ran, why, and what it produced.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub adapter: AdapterDescriptor,
    pub decision: RoutingDecision,
    pub output: GenerationResult,
}

impl Dispatched {
    /// The normalized envelope returned to callers.
    pub fn envelope(&self) -> ResponseEnvelope {
        ResponseEnvelope {
            model_used: self.adapter.name.clone(),
            provider: self.adapter.provider.clone(),
            output: self.output.clone(),
            meta: ResponseMeta {
                reason: self.decision.reason.as_str().to_string(),
            },
        }
    }
}

/// `{model_used, provider, output, meta: {reason}}`
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub model_used: String,
    pub provider: String,
    pub output: GenerationResult,
    pub meta: ResponseMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AdapterKind;
    use crate::routing::{Classification, RoutingReason};

    #[test]
    fn test_envelope_shape() {
        let dispatched = Dispatched {
            adapter: AdapterDescriptor::new("imagen-3.0-generate-001", "google-gemini", AdapterKind::Image),
            decision: RoutingDecision {
                target: AdapterKind::Image,
                reason: RoutingReason::KeywordImage,
                classification: Classification::Image,
            },
            output: GenerationResult::image_with_note("https://r.example/prompt/x", "fallback used"),
        };

        let json = serde_json::to_value(dispatched.envelope()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model_used": "imagen-3.0-generate-001",
                "provider": "google-gemini",
                "output": { "image_url": "https://r.example/prompt/x", "note": "fallback used" },
                "meta": { "reason": "keyword_image" }
            })
        );
    }
}
