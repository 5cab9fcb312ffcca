use thiserror::Error;

use crate::provider::AdapterKind;

/// Request-level failures surfaced by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required credential or adapter wiring is missing. Not retryable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The selected adapter failed after exhausting its own policy.
    ///
    /// For text this is the first upstream failure. For image it means the
    /// fallback chain itself broke, which should not normally happen.
    #[error("{adapter} provider '{provider}' failed: {message}")]
    Provider {
        adapter: AdapterKind,
        provider: String,
        message: String,
    },
}

impl DispatchError {
    /// Short error category for clients and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Configuration(_) => "configuration",
            DispatchError::Provider { .. } => "provider",
        }
    }

    /// Which adapter failed, for provider errors.
    pub fn adapter(&self) -> Option<AdapterKind> {
        match self {
            DispatchError::Configuration(_) => None,
            DispatchError::Provider { adapter, .. } => Some(*adapter),
        }
    }
}
