//! Common test utilities for clientes integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use clientes_service::{create_router, AppState, ServiceConfig};
use clientes_store::SqliteStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a harness after adjusting the default test configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let (router, temp_dir) = build_router(adjust).await;
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
        }
    }

    /// Register a customer and return its JSON representation.
    pub async fn create_customer(&self, name: &str, email: &str) -> Value {
        let response = self
            .server
            .post("/clientes")
            .json(&json!({ "name": name, "email": email }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Register a customer and return its ID.
    pub async fn create_customer_id(&self, name: &str, email: &str) -> String {
        self.create_customer(name, email).await["id"]
            .as_str()
            .expect("customer id")
            .to_string()
    }

    /// Deposit `amount` and return the response body.
    pub async fn deposit(&self, id: &str, amount: &str) -> Value {
        let response = self
            .server
            .post(&format!("/clientes/{id}/depositar"))
            .json(&json!({ "amount": amount }))
            .await;
        response.assert_status_ok();
        response.json()
    }
}

/// Build the service router over a fresh database in a temp directory.
pub async fn build_router(adjust: impl FnOnce(&mut ServiceConfig)) -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("clientes.db");
    let store = SqliteStore::open(&db_path, 5)
        .await
        .expect("Failed to open store");

    let mut config = ServiceConfig {
        port: 0,
        rate_limit_max: 10_000,
        db_path: db_path.to_string_lossy().to_string(),
        db_max_connections: 5,
        cors_origins: vec!["*".into()],
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 30,
    };
    adjust(&mut config);

    let state = AppState::new(Arc::new(store), config);
    let router: Router = create_router(state);

    (router, temp_dir)
}
