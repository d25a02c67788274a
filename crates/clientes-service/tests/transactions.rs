//! Deposit, withdrawal and transaction history integration tests.

mod common;

use std::str::FromStr;

use axum::http::StatusCode;
use common::TestHarness;
use clientes_core::Decimal;
use serde_json::{json, Value};

fn dec(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).expect("decimal")
}

// ============================================================================
// Deposits and withdrawals
// ============================================================================

#[tokio::test]
async fn deposits_read_back_exactly() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    harness.deposit(&id, "5.00").await;
    let body = harness.deposit(&id, "10.00").await;
    assert_eq!(body["balance"], "15.00");

    let body: Value = harness.server.get(&format!("/clientes/{id}")).await.json();
    assert_eq!(body["balance"], "15.00");
}

#[tokio::test]
async fn amount_accepts_json_numbers() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    let response = harness
        .server
        .post(&format!("/clientes/{id}/depositar"))
        .json(&json!({ "amount": 12.5 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(dec(&body["balance"]), Decimal::new(125, 1));
}

#[tokio::test]
async fn long_number_amounts_are_exact() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    let body: Value = serde_json::from_str(r#"{"amount": 1234567890.123456789}"#).unwrap();
    let response = harness
        .server
        .post(&format!("/clientes/{id}/depositar"))
        .json(&body)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["balance"], "1234567890.123456789");

    let history: Value = harness
        .server
        .get(&format!("/clientes/{id}/transacoes"))
        .await
        .json();
    assert_eq!(history["items"][0]["amount"], "1234567890.123456789");
}

#[tokio::test]
async fn withdraw_more_than_balance_is_rejected() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;
    harness.deposit(&id, "15.00").await;

    let response = harness
        .server
        .post(&format!("/clientes/{id}/sacar"))
        .json(&json!({ "amount": "20.00" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INSUFICIENT_BALANCE");

    let body: Value = harness.server.get(&format!("/clientes/{id}")).await.json();
    assert_eq!(body["balance"], "15.00");

    let history: Value = harness
        .server
        .get(&format!("/clientes/{id}/transacoes"))
        .await
        .json();
    assert_eq!(history["total_items"], 1);
}

#[tokio::test]
async fn withdraw_success() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;
    harness.deposit(&id, "15.00").await;

    let response = harness
        .server
        .post(&format!("/clientes/{id}/sacar"))
        .json(&json!({ "amount": "15.00" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(dec(&body["balance"]), Decimal::ZERO);
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    for (path, amount) in [
        ("depositar", json!("0")),
        ("depositar", json!(-3)),
        ("sacar", json!("0.00")),
        ("sacar", json!("abc")),
    ] {
        let response = harness
            .server
            .post(&format!("/clientes/{id}/{path}"))
            .json(&json!({ "amount": amount }))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_REQUEST");
    }
}

#[tokio::test]
async fn deposit_to_unknown_customer_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/clientes/6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f/depositar")
        .json(&json!({ "amount": "1.00" }))
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["code"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposits_all_land() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;
    let path = format!("/clientes/{id}/depositar");

    let requests: Vec<_> = (0..20)
        .map(|_| {
            let request = harness
                .server
                .post(&path)
                .json(&json!({ "amount": "2.50" }));
            async move { request.await }
        })
        .collect();
    for response in futures::future::join_all(requests).await {
        response.assert_status_ok();
    }

    let body: Value = harness.server.get(&format!("/clientes/{id}")).await.json();
    assert_eq!(dec(&body["balance"]), Decimal::new(5000, 2));

    let history: Value = harness
        .server
        .get(&format!("/clientes/{id}/transacoes?size=100"))
        .await
        .json();
    let items = history["items"].as_array().unwrap();
    assert_eq!(items.len(), 20);
    let sum: Decimal = items.iter().map(|t| dec(&t["amount"])).sum();
    assert_eq!(sum, dec(&body["balance"]));
}

// ============================================================================
// Transaction history
// ============================================================================

#[tokio::test]
async fn history_is_newest_first_with_signed_amounts() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;
    harness.deposit(&id, "5.00").await;
    harness
        .server
        .post(&format!("/clientes/{id}/sacar"))
        .json(&json!({ "amount": "2.00" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get(&format!("/clientes/{id}/transacoes"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 10);
    assert_eq!(body["total_items"], 2);
    assert_eq!(body["total_pages"], 1);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["type"], "withdraw");
    assert_eq!(items[0]["amount"], "-2.00");
    assert_eq!(items[0]["customer_id"], id.as_str());
    assert!(items[0]["transaction_id"].is_string());
    assert!(items[0]["created_at"].is_string());
    assert_eq!(items[1]["type"], "deposit");
    assert_eq!(items[1]["amount"], "5.00");
}

#[tokio::test]
async fn history_pagination_boundaries() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;
    for i in 1..=15 {
        harness.deposit(&id, &format!("{i}.00")).await;
    }

    let first: Value = harness
        .server
        .get(&format!("/clientes/{id}/transacoes?page=1&size=10"))
        .await
        .json();
    assert_eq!(first["items"].as_array().unwrap().len(), 10);
    assert_eq!(first["total_pages"], 2);
    assert_eq!(first["items"][0]["amount"], "15.00");

    let second: Value = harness
        .server
        .get(&format!("/clientes/{id}/transacoes?page=2&size=10"))
        .await
        .json();
    assert_eq!(second["items"].as_array().unwrap().len(), 5);
    assert_eq!(second["items"][4]["amount"], "1.00");

    let response = harness
        .server
        .get(&format!("/clientes/{id}/transacoes?page=3&size=10"))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_PAGE");
}

#[tokio::test]
async fn history_of_new_customer_is_empty() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    let response = harness
        .server
        .get(&format!("/clientes/{id}/transacoes"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["total_pages"], 0);
}

#[tokio::test]
async fn history_rejects_bad_page_parameters() {
    let harness = TestHarness::new().await;
    let id = harness.create_customer_id("Ana", "ana@example.com").await;

    for query in ["page=0", "size=0", "page=abc"] {
        let response = harness
            .server
            .get(&format!("/clientes/{id}/transacoes?{query}"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn history_of_unknown_customer_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/clientes/6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f/transacoes")
        .await;

    response.assert_status_not_found();
}
