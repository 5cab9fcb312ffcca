use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::Dispatched;

/// Longest session title kept verbatim; longer first prompts are cut here.
pub const SESSION_TITLE_MAX_CHARS: usize = 50;

/// A user's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    /// Derived from the first prompt
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One prompt and the result it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: i64,
    pub session_id: String,
    pub prompt: String,
    /// Text answer or image URL
    pub response: String,
    /// "text" or "image"
    pub kind: String,
    pub model: String,
    pub provider: String,
    pub reason: String,
    pub fallback_used: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields of an exchange that come from the dispatch outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExchange {
    pub prompt: String,
    pub response: String,
    pub kind: String,
    pub model: String,
    pub provider: String,
    pub reason: String,
    pub fallback_used: bool,
}

impl NewExchange {
    pub fn from_dispatched(prompt: &str, dispatched: &Dispatched) -> Self {
        Self {
            prompt: prompt.to_string(),
            response: dispatched.output.content().to_string(),
            kind: dispatched.output.kind().as_str().to_string(),
            model: dispatched.adapter.name.clone(),
            provider: dispatched.adapter.provider.clone(),
            reason: dispatched.decision.reason.as_str().to_string(),
            fallback_used: dispatched.output.used_fallback(),
        }
    }
}

/// Session title for a first prompt: up to 50 characters, `...` appended when cut.
pub fn session_title(prompt: &str) -> String {
    let prompt = prompt.trim();
    match prompt.char_indices().nth(SESSION_TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &prompt[..cut]),
        None => prompt.to_string(),
    }
}
