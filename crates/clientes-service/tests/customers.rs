//! Customer lifecycle integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::{json, Value};

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_customer_success() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/clientes")
        .json(&json!({ "name": "Ana Souza", "email": "Ana@Example.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["name"], "Ana Souza");
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["balance"], "0");
    assert!(body["id"].as_str().is_some_and(|id| id.len() == 36));
}

#[tokio::test]
async fn create_customer_duplicate_email_fails() {
    let harness = TestHarness::new().await;
    harness.create_customer("Ana", "ana@example.com").await;

    let response = harness
        .server
        .post("/clientes")
        .json(&json!({ "name": "Other", "email": "ANA@example.com" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "EMAIL_ALREADY_EXISTS");

    let all: Vec<Value> = harness.server.get("/clientes").await.json();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn create_customer_invalid_input_fails() {
    let harness = TestHarness::new().await;

    for body in [
        json!({ "name": "A", "email": "ana@example.com" }),
        json!({ "name": "Ana", "email": "not-an-email" }),
        json!({ "name": "Ana" }),
    ] {
        let response = harness.server.post("/clientes").json(&body).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_REQUEST");
    }
}

#[tokio::test]
async fn malformed_json_is_invalid_request() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/clientes")
        .content_type("application/json")
        .bytes("{ not json".into())
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_REQUEST");
}

// ============================================================================
// Read
// ============================================================================

#[tokio::test]
async fn list_customers_in_creation_order() {
    let harness = TestHarness::new().await;
    let first = harness.create_customer_id("Ana", "ana@example.com").await;
    let second = harness.create_customer_id("Bia", "bia@example.com").await;

    let response = harness.server.get("/clientes").await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    let ids: Vec<_> = body.iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
}

#[tokio::test]
async fn get_customer_success() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    let response = harness.server.get(&format!("/clientes/{id}")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["name"], "Ana");
}

#[tokio::test]
async fn get_unknown_customer_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/clientes/6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f")
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["code"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test]
async fn get_malformed_id_is_invalid_request() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/clientes/not-a-uuid").await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_REQUEST");
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn update_customer_partial() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    let response = harness
        .server
        .put(&format!("/clientes/{id}"))
        .json(&json!({ "name": "Ana Maria" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Ana Maria");
    assert_eq!(body["email"], "ana@example.com");
}

#[tokio::test]
async fn update_with_blank_fields_changes_nothing() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    let response = harness
        .server
        .put(&format!("/clientes/{id}"))
        .json(&json!({ "name": "  ", "email": "" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Ana");
    assert_eq!(body["email"], "ana@example.com");
}

#[tokio::test]
async fn update_to_taken_email_fails() {
    let harness = TestHarness::new().await;
    harness.create_customer("Ana", "ana@example.com").await;
    let id = harness.create_customer_id("Bia", "bia@example.com").await;

    let response = harness
        .server
        .put(&format!("/clientes/{id}"))
        .json(&json!({ "email": "ana@example.com" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "EMAIL_ALREADY_EXISTS");
}

#[tokio::test]
async fn update_unknown_customer_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .put("/clientes/6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f")
        .json(&json!({ "name": "Ana" }))
        .await;

    response.assert_status_not_found();
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_customer_removes_it_and_its_ledger() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;
    harness.deposit(&id, "10.00").await;

    let response = harness.server.delete(&format!("/clientes/{id}")).await;
    response.assert_status(StatusCode::NO_CONTENT);

    harness
        .server
        .get(&format!("/clientes/{id}"))
        .await
        .assert_status_not_found();
    harness
        .server
        .get(&format!("/clientes/{id}/transacoes"))
        .await
        .assert_status_not_found();
    harness
        .server
        .delete(&format!("/clientes/{id}"))
        .await
        .assert_status_not_found();
}
