//! API key authentication with one key per user.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Maps presented API keys to user ids.
///
/// Accepts the key in either:
/// - `Authorization: Bearer <key>` header
/// - `X-API-Key: <key>` header
pub struct ApiKeyAuthenticator {
    /// (user_id, key) pairs
    keys: Vec<(String, String)>,
}

impl ApiKeyAuthenticator {
    /// Build from a `user_id -> key` map.
    pub fn new(keys: &BTreeMap<String, String>) -> Result<Self, AuthError> {
        if keys.is_empty() {
            return Err(AuthError::Misconfigured(
                "at least one entry in auth.api_keys is required for api_key auth".to_string(),
            ));
        }
        if let Some((user, _)) = keys.iter().find(|(_, key)| key.trim().is_empty()) {
            return Err(AuthError::Misconfigured(format!(
                "auth.api_keys.{} must not be empty",
                user
            )));
        }

        Ok(Self {
            keys: keys
                .iter()
                .map(|(user, key)| (user.clone(), key.clone()))
                .collect(),
        })
    }

    fn extract_key(request: &AuthRequest) -> Option<&str> {
        if let Some(auth_header) = request.header("authorization") {
            let token = auth_header
                .strip_prefix("Bearer ")
                .or_else(|| auth_header.strip_prefix("bearer "));
            if let Some(token) = token {
                return Some(token.trim());
            }
        }

        request.header("x-api-key").map(str::trim)
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = Self::extract_key(request).ok_or(AuthError::MissingKey)?;

        // Compare against every key so timing does not reveal which user matched.
        let mut matched = None;
        for (user, key) in &self.keys {
            if constant_time_eq(provided.as_bytes(), key.as_bytes()) && matched.is_none() {
                matched = Some(user);
            }
        }

        matched
            .map(|user| Identity::new(user.clone(), "api_key"))
            .ok_or(AuthError::UnknownKey)
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("alice".to_string(), "key-alice".to_string()),
            ("bob".to_string(), "key-bob".to_string()),
        ])
    }

    fn request(headers: &[(&str, &str)]) -> AuthRequest {
        AuthRequest {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            source_ip: "127.0.0.1".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_bearer_maps_to_user() {
        let auth = ApiKeyAuthenticator::new(&keys()).unwrap();

        let identity = auth
            .authenticate(&request(&[("Authorization", "Bearer key-bob")]))
            .await
            .unwrap();
        assert_eq!(identity, Identity::new("bob", "api_key"));

        let identity = auth
            .authenticate(&request(&[("Authorization", "bearer key-alice")]))
            .await
            .unwrap();
        assert_eq!(identity.user_id, "alice");
    }

    #[tokio::test]
    async fn test_x_api_key_header() {
        let auth = ApiKeyAuthenticator::new(&keys()).unwrap();
        let identity = auth
            .authenticate(&request(&[("X-API-Key", "key-alice")]))
            .await
            .unwrap();
        assert_eq!(identity.user_id, "alice");
    }

    #[tokio::test]
    async fn test_rejections() {
        let auth = ApiKeyAuthenticator::new(&keys()).unwrap();

        let result = auth
            .authenticate(&request(&[("Authorization", "Bearer wrong")]))
            .await;
        assert!(matches!(result, Err(AuthError::UnknownKey)));

        let result = auth.authenticate(&request(&[])).await;
        assert!(matches!(result, Err(AuthError::MissingKey)));

        let result = auth
            .authenticate(&request(&[("Authorization", "Basic abc")]))
            .await;
        assert!(matches!(result, Err(AuthError::MissingKey)));
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(
            ApiKeyAuthenticator::new(&BTreeMap::new()),
            Err(AuthError::Misconfigured(_))
        ));

        let blank = BTreeMap::from([("carol".to_string(), " ".to_string())]);
        match ApiKeyAuthenticator::new(&blank) {
            Err(AuthError::Misconfigured(msg)) => assert!(msg.contains("auth.api_keys.carol")),
            _ => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }
}
