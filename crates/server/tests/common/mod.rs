//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock status checker injected, enabling E2E testing without a
//! status-check backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use shiptrack_core::{
    testing::MockStatusChecker, Config, OrchestratorConfig, ServerConfig, StatusCheckConfig,
    StatusUpdateOrchestrator,
};
use shiptrack_server::state::AppState;

/// Re-export fixtures for test convenience
pub use shiptrack_core::testing::fixtures;

/// Test fixture for E2E testing with a mock status checker.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_single_update() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/status-updates/single", json!({
///         "shipment": { "id": "s1", "trackingNumber": "1Z999" }
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock status checker - configure responses and failures
    pub checker: Arc<MockStatusChecker>,
    /// Orchestrator behind the router
    pub orchestrator: Arc<StatusUpdateOrchestrator>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with fast retry and batch delays.
    pub async fn new() -> Self {
        Self::with_orchestrator_config(OrchestratorConfig {
            retry_delay_ms: 10,
            batch_delay_ms: 10,
            ..Default::default()
        })
        .await
    }

    /// Create a test fixture with a custom orchestrator configuration.
    pub async fn with_orchestrator_config(orchestrator_config: OrchestratorConfig) -> Self {
        let checker = Arc::new(MockStatusChecker::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            status_check: StatusCheckConfig {
                functions_url: "http://127.0.0.1:1".to_string(),
                function_name: "checkShipmentStatus".to_string(),
                timeout_ms: 5_000,
            },
            orchestrator: orchestrator_config.clone(),
        };

        let orchestrator = Arc::new(StatusUpdateOrchestrator::new(
            orchestrator_config,
            checker.clone(),
        ));
        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator)));
        let router = shiptrack_server::api::create_router(state);

        Self {
            router,
            checker,
            orchestrator,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Fetch the Prometheus text output.
    pub async fn metrics_text(&self) -> String {
        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/metrics")
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("metrics are not UTF-8")
    }

    /// Poll until the current run finishes.
    pub async fn wait_until_idle(&self, max_wait: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + max_wait;
        while tokio::time::Instant::now() < deadline {
            let response = self.get("/api/v1/status-updates/progress").await;
            if response.body["is_updating"] == false {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
