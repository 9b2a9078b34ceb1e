use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt as _;

use utsav_tickets::config::GatewayConfig;
use utsav_tickets::infra::gateway::{HttpPaymentGateway, sign_webhook_payload};
use utsav_tickets::infra::notify::HttpNotifier;
use utsav_tickets::infra::storage::HttpObjectStorage;
use utsav_tickets::router::build_router;
use utsav_tickets::state::AppState;

const WEBHOOK_SECRET: &str = "whsec_test";

/// Router over a disconnected database — enough to exercise signature
/// checking and envelope handling, which never reach the store.
fn test_state() -> AppState {
    let gateway_config = GatewayConfig {
        base_url: "http://gateway.invalid".to_owned(),
        client_id: "client".to_owned(),
        client_secret: "secret".to_owned(),
        webhook_secret: WEBHOOK_SECRET.to_owned(),
        timeout_secs: 1,
    };
    AppState {
        db: sea_orm::DatabaseConnection::default(),
        gateway: HttpPaymentGateway::new(gateway_config).unwrap(),
        storage: HttpObjectStorage::new(
            "http://storage.invalid".to_owned(),
            "key".to_owned(),
        )
        .unwrap(),
        notifier: HttpNotifier::new("http://notifier.invalid".to_owned()).unwrap(),
        jwt_secret: "test-jwt-secret".to_owned(),
        webhook_secret: WEBHOOK_SECRET.to_owned(),
        check_in_base_url: "https://app.utsav.test".to_owned(),
        payment_notify_url: None,
    }
}

async fn post_webhook(
    body: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
) -> StatusCode {
    let router = build_router(test_state());
    let mut request = Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("content-type", "application/json");
    if let Some(ts) = timestamp {
        request = request.header("x-webhook-timestamp", ts);
    }
    if let Some(sig) = signature {
        request = request.header("x-webhook-signature", sig);
    }
    let response = router
        .oneshot(request.body(Body::from(body.to_owned())).unwrap())
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn should_reject_webhook_without_signature() {
    let body = r#"{"type":"PAYMENT_SUCCESS_WEBHOOK","data":{"order":{"order_id":"ord_1"}}}"#;
    assert_eq!(post_webhook(body, None, None).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_reject_webhook_with_bad_signature() {
    let body = r#"{"type":"PAYMENT_SUCCESS_WEBHOOK","data":{"order":{"order_id":"ord_1"}}}"#;
    let status = post_webhook(body, Some("1700000000"), Some("AAAA")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_reject_signed_success_webhook_without_order_tags() {
    let body = r#"{"type":"PAYMENT_SUCCESS_WEBHOOK","data":{"order":{"order_id":"ord_1"}}}"#;
    let sig = sign_webhook_payload(WEBHOOK_SECRET, "1700000000", body.as_bytes());
    let status = post_webhook(body, Some("1700000000"), Some(&sig)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_acknowledge_unknown_webhook_type() {
    let body = r#"{"type":"REFUND_STATUS_WEBHOOK","data":{"order":{"order_id":"ord_1"}}}"#;
    let sig = sign_webhook_payload(WEBHOOK_SECRET, "1700000000", body.as_bytes());
    let status = post_webhook(body, Some("1700000000"), Some(&sig)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn should_acknowledge_failed_payment_webhook() {
    let body = format!(
        r#"{{"type":"PAYMENT_FAILED_WEBHOOK","data":{{"order":{{"order_id":"ord_1","order_tags":{{"user_id":"{}"}}}}}}}}"#,
        uuid::Uuid::new_v4()
    );
    let sig = sign_webhook_payload(WEBHOOK_SECRET, "1700000000", body.as_bytes());
    let status = post_webhook(&body, Some("1700000000"), Some(&sig)).await;
    assert_eq!(status, StatusCode::OK);
}
