//! Prompt classification and adapter routing.
//!
//! Both are pure functions of the prompt, the caller's [`ModeHint`] and the
//! configured keyword sets, so identical inputs always produce the same
//! [`RoutingDecision`].

mod classifier;
mod router;
mod types;

pub use classifier::KeywordClassifier;
pub use router::PromptRouter;
pub use types::{Classification, ModeHint, RoutingDecision, RoutingReason};
