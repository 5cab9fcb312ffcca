use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// What an authenticator gets to see of an HTTP request.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

impl AuthRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Authenticated caller. `user_id` scopes chat sessions and history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            method: method.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", "none")
    }
}
