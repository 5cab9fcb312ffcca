//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Routing (decisions by reason)
//! - Adapters (request outcomes, latency, token usage)
//! - Image fallback chain (fallbacks by cause)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Routing
// =============================================================================

/// Routing decisions by reason.
pub static ROUTING_DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nexus_routing_decisions_total", "Total routing decisions"),
        &["reason"], // "user_hint_image", "user_hint_text", "keyword_image", "default_text"
    )
    .unwrap()
});

// =============================================================================
// Adapters
// =============================================================================

/// Adapter invocations by provider and result.
pub static ADAPTER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nexus_adapter_requests_total",
            "Total adapter invocations",
        ),
        &["provider", "result"], // result: "success", "fallback", "failure"
    )
    .unwrap()
});

/// Adapter latency in seconds, fallback time included.
pub static ADAPTER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "nexus_adapter_duration_seconds",
            "Duration of adapter generate calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["provider"],
    )
    .unwrap()
});

/// LLM token usage.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nexus_llm_tokens_total", "LLM tokens used"),
        &["provider", "direction"], // direction: "input", "output"
    )
    .unwrap()
});

// =============================================================================
// Image fallback chain
// =============================================================================

/// Fallback renderer uses by primary-tier failure cause.
pub static IMAGE_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nexus_image_fallbacks_total",
            "Image requests served by the fallback renderer",
        ),
        &["cause"], // "no_credential", "timeout", "transport", "status", "malformed"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ROUTING_DECISIONS.clone()),
        Box::new(ADAPTER_REQUESTS.clone()),
        Box::new(ADAPTER_DURATION.clone()),
        Box::new(LLM_TOKENS.clone()),
        Box::new(IMAGE_FALLBACKS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        ROUTING_DECISIONS.with_label_values(&["default_text"]).inc();
        IMAGE_FALLBACKS.with_label_values(&["status"]).inc();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"nexus_routing_decisions_total".to_string()));
        assert!(names.contains(&"nexus_image_fallbacks_total".to_string()));
    }
}
