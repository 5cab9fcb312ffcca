//! Common test utilities for E2E testing with mocks.
//!
//! The fixture builds the full router in-process with mock adapters standing
//! in for the text and image providers, and sqlite stores in a temp dir.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use nexus_core::testing::MockAdapter;
use nexus_core::{
    create_audit_system, create_authenticator, AuditFilter, AuditRecord, AuditStore, AuthMethod,
    Config, Dispatcher, PromptRouter, SqliteAuditStore, SqliteHistoryStore,
};
use nexus_server::api::create_router;
use nexus_server::state::AppState;

/// Re-export fixtures for test convenience
pub use nexus_core::testing::fixtures;

/// Test fixture for E2E testing with mock providers.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_chat() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/chat", json!({ "prompt": "hi" })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    /// Mock text adapter - configure answers and failures
    pub text: Arc<MockAdapter>,
    /// Mock image adapter
    pub image: Arc<MockAdapter>,
    pub audit_store: Arc<SqliteAuditStore>,
    /// Keeps the databases alive for the fixture's lifetime
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

/// Fixture options.
#[derive(Debug, Default)]
pub struct TestConfig {
    /// user id -> key; enables API-key auth when non-empty
    pub api_keys: BTreeMap<String, String>,
}

impl TestConfig {
    pub fn with_users(users: &[(&str, &str)]) -> Self {
        Self {
            api_keys: users
                .iter()
                .map(|(user, key)| (user.to_string(), key.to_string()))
                .collect(),
        }
    }
}

impl TestFixture {
    /// Anonymous access, default routing.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.database.path = temp_dir.path().join("nexus.db");
        if !test_config.api_keys.is_empty() {
            config.auth.method = AuthMethod::ApiKey;
            config.auth.api_keys = test_config.api_keys;
        }

        let text = Arc::new(MockAdapter::text());
        let image = Arc::new(MockAdapter::image());
        let dispatcher = Dispatcher::new(
            PromptRouter::from_config(&config.routing),
            text.clone(),
            image.clone(),
        )
        .expect("Failed to create dispatcher");

        let authenticator =
            Arc::from(create_authenticator(&config.auth).expect("Failed to create authenticator"));
        let history = Arc::new(
            SqliteHistoryStore::new(&temp_dir.path().join("history.db"))
                .expect("Failed to create history store"),
        );
        let audit_store = Arc::new(
            SqliteAuditStore::new(&temp_dir.path().join("audit.db"))
                .expect("Failed to create audit store"),
        );
        let (audit_handle, audit_writer) = create_audit_system(audit_store.clone(), 100);
        tokio::spawn(audit_writer.run());

        let state = Arc::new(AppState::new(
            config,
            dispatcher,
            authenticator,
            history,
            audit_handle,
            audit_store.clone(),
        ));

        Self {
            router: create_router(state),
            text,
            image,
            audit_store,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    pub async fn get_as(&self, path: &str, api_key: &str) -> TestResponse {
        let bearer = format!("Bearer {}", api_key);
        self.request("GET", path, None, &[("authorization", &bearer)])
            .await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), &[]).await
    }

    pub async fn post_as(&self, path: &str, body: Value, api_key: &str) -> TestResponse {
        self.request("POST", path, Some(body), &[("x-api-key", api_key)])
            .await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }

    /// Wait until the audit writer has persisted at least `count` events
    /// matching `filter`.
    pub async fn wait_for_audit(&self, filter: AuditFilter, count: usize) -> Vec<AuditRecord> {
        for _ in 0..100 {
            let records = self.audit_store.query(&filter).unwrap();
            if records.len() >= count {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("audit events did not arrive in time");
    }
}
