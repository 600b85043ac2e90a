mod common;

use common::TestApp;
use order_service::models::{FulfillmentStatus, PaymentRecordStatus, PaymentStatus};
use order_service::services::Store;
use rust_decimal::Decimal;
use serde_json::{json, Value};

#[tokio::test]
async fn completed_notification_settles_order() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let order = app.place_online_order(&catalog, None).await;

    let response = app
        .post_webhook(json!({
            "order_id": order.id,
            "status": "completed",
            "payment_method": "qris",
            "amount": 20000
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let stored = app.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Lunas);
    assert_eq!(stored.fulfillment_status, FulfillmentStatus::PesananDiterima);

    let payments = app.store.payments_for(order.id);
    assert_eq!(payments.len(), 2);
    let appended = &payments[1];
    assert_eq!(appended.status, PaymentRecordStatus::Success);
    assert_eq!(appended.amount, Decimal::new(20000, 0));
    assert_eq!(appended.reference_code.as_deref(), Some("qris"));
}

#[tokio::test]
async fn replayed_completion_keeps_order_paid() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let order = app.place_online_order(&catalog, None).await;
    let body = json!({
        "order_id": order.id.to_string(),
        "status": "completed",
        "payment_method": "qris",
        "amount": "20000"
    });

    for _ in 0..2 {
        let response = app.post_webhook(body.clone()).await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let stored = app.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Lunas);

    let successes = app
        .store
        .payments_for(order.id)
        .iter()
        .filter(|p| p.status == PaymentRecordStatus::Success)
        .count();
    assert_eq!(successes, 2);

}

#[tokio::test]
async fn failed_after_completed_cancels_order() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let order = app.place_online_order(&catalog, None).await;

    let response = app
        .post_webhook(json!({
            "order_id": order.id,
            "status": "completed",
            "payment_method": "qris",
            "amount": 20000
        }))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .post_webhook(json!({ "order_id": order.id, "status": "failed" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let stored = app.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Batal);
}

#[tokio::test]
async fn failed_notification_cancels_unpaid_order() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let order = app.place_online_order(&catalog, None).await;

    let response = app
        .post_webhook(json!({ "order_id": order.id, "status": "failed" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let stored = app.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Batal);
}

#[tokio::test]
async fn other_statuses_are_acknowledged_without_change() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let order = app.place_online_order(&catalog, None).await;
    let writes = app.store.write_count();

    let response = app
        .post_webhook(json!({ "order_id": order.id, "status": "pending" }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.store.write_count(), writes);
}

#[tokio::test]
async fn unknown_order_is_not_found_and_untouched() {
    let app = TestApp::spawn().await;
    app.seed_catalog().await;
    let writes = app.store.write_count();

    let response = app
        .post_webhook(json!({
            "order_id": 987654,
            "status": "completed",
            "payment_method": "qris",
            "amount": 20000
        }))
        .await;

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(app.store.write_count(), writes);
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let app = TestApp::spawn().await;

    for body in [
        json!({ "status": "completed" }),
        json!({ "order_id": 1 }),
        json!({ "order_id": "abc", "status": "completed" }),
    ] {
        let response = app.post_webhook(body).await;
        assert_eq!(response.status().as_u16(), 400);
    }
}

#[tokio::test]
async fn non_string_status_is_a_json_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .post_webhook(json!({ "order_id": 1, "status": 5 }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().starts_with("Json parse error"));
}
