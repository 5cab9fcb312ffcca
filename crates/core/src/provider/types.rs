//! Shared types for provider adapters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of output an adapter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Plain text and code answers.
    Text,
    /// Images, referenced by URL.
    Image,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Text => "text",
            AdapterKind::Image => "image",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an adapter: which model, from which provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    /// Model identifier (e.g. "llama-3.3-70b-versatile").
    pub name: String,
    /// Provider identifier (e.g. "groq").
    pub provider: String,
    pub kind: AdapterKind,
}

impl AdapterDescriptor {
    pub fn new(name: impl Into<String>, provider: impl Into<String>, kind: AdapterKind) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            kind,
        }
    }
}

/// Normalized output of a generation.
///
/// Serialized untagged, so clients see either `{"text": ..}` or
/// `{"image_url": .., "note": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResult {
    Image {
        image_url: String,
        /// Present only when the fallback renderer produced the URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    Text {
        text: String,
    },
}

impl GenerationResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(image_url: impl Into<String>) -> Self {
        Self::Image {
            image_url: image_url.into(),
            note: None,
        }
    }

    pub fn image_with_note(image_url: impl Into<String>, note: impl Into<String>) -> Self {
        Self::Image {
            image_url: image_url.into(),
            note: Some(note.into()),
        }
    }

    /// The adapter category this variant belongs to.
    pub fn kind(&self) -> AdapterKind {
        match self {
            Self::Text { .. } => AdapterKind::Text,
            Self::Image { .. } => AdapterKind::Image,
        }
    }

    /// Text body or image URL, whichever is populated.
    pub fn content(&self) -> &str {
        match self {
            Self::Text { text } => text,
            Self::Image { image_url, .. } => image_url,
        }
    }

    /// Whether the image fallback tier produced this result.
    pub fn used_fallback(&self) -> bool {
        matches!(self, Self::Image { note: Some(_), .. })
    }
}
