//! Routing vocabulary: what the caller asked for, what the prompt looks like,
//! and why an adapter was picked.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::provider::AdapterKind;

/// Caller-supplied override. `Auto` defers to classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ModeHint {
    #[default]
    Auto,
    Text,
    Image,
}

impl ModeHint {
    /// Lenient parse: case-insensitive, anything unrecognized means `Auto`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => ModeHint::Text,
            "image" => ModeHint::Image,
            _ => ModeHint::Auto,
        }
    }
}

impl From<String> for ModeHint {
    fn from(value: String) -> Self {
        ModeHint::parse(&value)
    }
}

/// Inferred intent of a prompt. Derived per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Text,
    Code,
    Image,
}

/// Why an adapter was selected. Observability only; never affects behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingReason {
    UserHintImage,
    UserHintText,
    KeywordImage,
    DefaultText,
}

impl RoutingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingReason::UserHintImage => "user_hint_image",
            RoutingReason::UserHintText => "user_hint_text",
            RoutingReason::KeywordImage => "keyword_image",
            RoutingReason::DefaultText => "default_text",
        }
    }
}

impl fmt::Display for RoutingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The adapter chosen for a request and the reason it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub target: AdapterKind,
    pub reason: RoutingReason,
    pub classification: Classification,
}
