//! Credit balance integration tests.

mod common;

use axum::http::StatusCode;
use common::{AsUser, TestHarness};

#[tokio::test]
async fn first_read_opens_account_with_one_credit() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/credits").as_user("u1").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits"], 1);
    assert_eq!(harness.store.account_count().await, 1);
}

#[tokio::test]
async fn repeated_reads_do_not_reset_balance() {
    let harness = TestHarness::new();
    harness.grant("u1", 9).await;

    for _ in 0..3 {
        let body: serde_json::Value = harness
            .server
            .get("/v1/credits")
            .as_user("u1")
            .await
            .json();
        assert_eq!(body["credits"], 10);
    }
    assert_eq!(harness.store.account_count().await, 1);
}

#[tokio::test]
async fn get_credits_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/credits").await;

    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn get_credits_with_bad_token_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Bearer not-a-test-token"),
        )
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn decrement_spends_one_credit() {
    let harness = TestHarness::new();
    harness.grant("u1", 1).await;

    let response = harness
        .server
        .post("/v1/credits/decrement")
        .as_user("u1")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits"], 1);
    assert_eq!(harness.balance("u1").await, 1);
}

#[tokio::test]
async fn decrement_at_zero_is_rejected() {
    let harness = TestHarness::new();

    // Spend the starting credit.
    harness.balance("u1").await;
    harness
        .server
        .post("/v1/credits/decrement")
        .as_user("u1")
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/credits/decrement")
        .as_user("u1")
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["balance"], 0);
    assert_eq!(harness.balance("u1").await, 0);
}

#[tokio::test]
async fn decrement_without_account_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/decrement")
        .as_user("nobody")
        .await;

    response.assert_status_not_found();
    assert_eq!(harness.store.account_count().await, 0);
}
