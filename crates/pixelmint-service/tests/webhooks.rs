//! Stripe webhook integration tests.

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::json;

use common::{test_config, TestHarness, WEBHOOK_SECRET};
use pixelmint_service::crypto::hmac_sha256_hex;

fn signature_header(secret: &str, body: &str, timestamp: i64) -> HeaderValue {
    let signature = hmac_sha256_hex(secret, &format!("{timestamp}.{body}")).unwrap();
    HeaderValue::from_str(&format!("t={timestamp},v1={signature}")).unwrap()
}

fn checkout_completed(user: &str, credits: serde_json::Value) -> String {
    json!({
        "id": "evt_test_1",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_1",
                "payment_status": "paid",
                "client_reference_id": user,
                "metadata": { "userId": user, "credits": credits }
            }
        }
    })
    .to_string()
}

async fn deliver(harness: &TestHarness, body: &str, signature: HeaderValue) -> axum_test::TestResponse {
    harness
        .server
        .post("/webhooks/stripe")
        .add_header(HeaderName::from_static("stripe-signature"), signature)
        .text(body)
        .await
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[tokio::test]
async fn signed_checkout_completed_credits_account() {
    let harness = TestHarness::new();
    assert_eq!(harness.balance("u1").await, 1);

    let body = checkout_completed("u1", json!(50));
    let response = deliver(&harness, &body, signature_header(WEBHOOK_SECRET, &body, now())).await;

    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["received"], true);
    assert_eq!(harness.balance("u1").await, 51);
}

#[tokio::test]
async fn purchase_creates_missing_account() {
    let harness = TestHarness::new();

    let body = checkout_completed("new_user", json!("10"));
    deliver(&harness, &body, signature_header(WEBHOOK_SECRET, &body, now()))
        .await
        .assert_status_ok();

    // Starting credit plus the purchase.
    assert_eq!(harness.balance("new_user").await, 11);
}

#[tokio::test]
async fn bad_signature_is_rejected_without_ledger_change() {
    let harness = TestHarness::new();
    harness.balance("u1").await;

    let body = checkout_completed("u1", json!(50));
    let response = deliver(&harness, &body, signature_header("whsec_wrong", &body, now())).await;

    response.assert_status_bad_request();
    assert_eq!(harness.balance("u1").await, 1);
}

#[tokio::test]
async fn tampered_body_is_rejected() {
    let harness = TestHarness::new();

    let signed = checkout_completed("u1", json!(10));
    let tampered = checkout_completed("u1", json!(100));
    let response = deliver(&harness, &tampered, signature_header(WEBHOOK_SECRET, &signed, now())).await;

    response.assert_status_bad_request();
    assert_eq!(harness.balance("u1").await, 1);
}

#[tokio::test]
async fn stale_timestamp_is_rejected() {
    let harness = TestHarness::new();

    let body = checkout_completed("u1", json!(50));
    let response = deliver(
        &harness,
        &body,
        signature_header(WEBHOOK_SECRET, &body, now() - 3600),
    )
    .await;

    response.assert_status_bad_request();
    assert_eq!(harness.balance("u1").await, 1);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let harness = TestHarness::new();

    let body = checkout_completed("u1", json!(50));
    let response = harness.server.post("/webhooks/stripe").text(&body).await;

    response.assert_status_bad_request();
    assert_eq!(harness.balance("u1").await, 1);
}

#[tokio::test]
async fn missing_secret_fails_closed() {
    let mut config = test_config();
    config.stripe_webhook_secret = None;
    let harness = TestHarness::build(config, |state| state);

    let body = checkout_completed("u1", json!(50));
    let response = deliver(&harness, &body, signature_header(WEBHOOK_SECRET, &body, now())).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"]["code"], "configuration_error");
    assert_eq!(harness.store.account_count().await, 0);
}

#[tokio::test]
async fn unpaid_session_is_acknowledged_but_not_credited() {
    let harness = TestHarness::new();

    let body = json!({
        "id": "evt_test_2",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_2",
                "payment_status": "unpaid",
                "metadata": { "userId": "u1", "credits": "50" }
            }
        }
    })
    .to_string();
    deliver(&harness, &body, signature_header(WEBHOOK_SECRET, &body, now()))
        .await
        .assert_status_ok();

    assert_eq!(harness.balance("u1").await, 1);
}

#[tokio::test]
async fn unknown_event_is_acknowledged() {
    let harness = TestHarness::new();

    let body = json!({
        "id": "evt_test_3",
        "type": "customer.created",
        "data": { "object": { "id": "cus_1" } }
    })
    .to_string();
    let response = deliver(&harness, &body, signature_header(WEBHOOK_SECRET, &body, now())).await;

    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["received"], true);
    assert_eq!(harness.store.account_count().await, 0);
}

#[tokio::test]
async fn signed_garbage_is_a_bad_request() {
    let harness = TestHarness::new();

    let body = "not json";
    deliver(&harness, body, signature_header(WEBHOOK_SECRET, body, now()))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let harness = TestHarness::new();

    let response = harness.server.get("/webhooks/stripe").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.header("allow"), "POST");
}
