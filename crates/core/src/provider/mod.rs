//! Provider adapters.
//!
//! Each backend is wrapped in an [`Adapter`] that owns its own failure
//! policy:
//!
//! - [`TextAdapter`]: one chat completion per request. A missing credential
//!   fails before any I/O; upstream errors propagate unchanged.
//! - [`ImageAdapter`]: primary generation API, then a keyless fallback
//!   renderer. Always returns an image.
//!
//! Adapters are constructed once from configuration and shared read-only.

mod image;
mod llm;
mod text;
mod traits;
mod types;

pub use image::{ImageAdapter, PrimaryFailure, FALLBACK_NOTE};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmUsage, OpenAiCompatibleClient};
pub use text::{TextAdapter, TEXT_CREDENTIAL};
pub use traits::{Adapter, AdapterError};
pub use types::{AdapterDescriptor, AdapterKind, GenerationResult};
