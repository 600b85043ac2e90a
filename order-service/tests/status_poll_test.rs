mod common;

use common::TestApp;
use order_service::models::{PaymentRecordStatus, PaymentStatus};
use order_service::services::{GatewayStatus, Store};
use serde_json::Value;

async fn check_status(app: &TestApp, order_id: i64) -> Value {
    let response = app
        .client
        .get(app.url(&format!("/api/public/orders/{}/check-status", order_id)))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn paid_order_is_answered_without_asking_the_gateway() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let order = app.place_online_order(&catalog, None).await;
    app.store.mark_order_paid(order.id).await.unwrap();

    let body = check_status(&app, order.id).await;

    assert_eq!(body["status"], "LUNAS");
    assert_eq!(body["message"], "Pesanan sudah lunas");
    assert_eq!(app.gateway.status_calls(), 0);
}

#[tokio::test]
async fn pending_gateway_leaves_order_unpaid() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let order = app.place_online_order(&catalog, None).await;

    let body = check_status(&app, order.id).await;

    assert_eq!(body["status"], "BELUM_BAYAR");
    assert_eq!(body["message"], "Pembayaran belum diterima");
    assert_eq!(app.gateway.status_calls(), 1);
}

#[tokio::test]
async fn completed_gateway_transaction_settles_order() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let order = app.place_online_order(&catalog, None).await;
    app.gateway.set_status(GatewayStatus::Completed);

    let body = check_status(&app, order.id).await;

    assert_eq!(body["status"], "LUNAS");
    assert_eq!(body["message"], "Pembayaran berhasil dikonfirmasi");

    let stored = app.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Lunas);
    let payments = app.store.payments_for(order.id);
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentRecordStatus::Success);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/public/orders/31337/check-status"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(app.gateway.status_calls(), 0);
}
