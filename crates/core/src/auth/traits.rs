use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};

/// Why a caller could not be identified.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No key in `Authorization: Bearer` or `X-API-Key`.
    #[error("API key required")]
    MissingKey,

    /// A key was sent but matches no configured user.
    #[error("Unknown API key")]
    UnknownKey,

    /// The authenticator itself cannot work with the given settings.
    #[error("Authentication misconfigured: {0}")]
    Misconfigured(String),
}

impl AuthError {
    /// Label for the auth failure counter.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingKey => "missing_key",
            AuthError::UnknownKey => "unknown_key",
            AuthError::Misconfigured(_) => "misconfigured",
        }
    }

    /// True when the caller is not at fault.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, AuthError::Misconfigured(_))
    }
}

/// Resolves the user that owns a request's chat sessions.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// "none" or "api_key"
    fn method_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_and_fault() {
        assert_eq!(AuthError::MissingKey.reason(), "missing_key");
        assert!(!AuthError::UnknownKey.is_server_fault());
        assert!(AuthError::Misconfigured("no keys".to_string()).is_server_fault());
    }
}
