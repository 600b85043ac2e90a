//! Payment confirmation paths: manual receipt upload, the Pakasir webhook and
//! storefront polling.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::{
    dtos::{MessageResponse, StatusCheckResponse, WebhookRequest},
    models::PaymentStatus,
    services::orders::ProofUpload,
    utils::{MultipartForm, ValidatedJson},
    AppState,
};

/// Fields: `bukti` (receipt image), `nomor_wa` (optional contact check).
pub async fn upload_payment_proof(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let file = form.take_file("bukti").ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Tidak ada file bukti yang diupload"))
    })?;
    let contact = form.text("nomor_wa");

    state
        .lifecycle
        .record_payment_proof(
            order_id,
            contact.as_deref(),
            ProofUpload {
                filename: file.filename,
                content_type: file.content_type,
                data: file.data,
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("Upload bukti berhasil")))
}

/// Pakasir calls this on every transaction state change.
pub async fn pakasir_webhook(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<WebhookRequest>,
) -> Result<Json<Value>, AppError> {
    let notification = payload.into_notification()?;
    let outcome = state.lifecycle.confirm_via_webhook(notification).await?;
    tracing::debug!(?outcome, "Webhook handled");

    Ok(Json(json!({ "status": "ok" })))
}

pub async fn check_status(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<StatusCheckResponse>, AppError> {
    let before = state
        .store
        .get_order(order_id)
        .await?
        .map(|order| order.payment_status);
    let status = state.lifecycle.poll_status(order_id).await?;

    let message = match (before, status) {
        (Some(PaymentStatus::Lunas), _) => "Pesanan sudah lunas",
        (_, PaymentStatus::Lunas) => "Pembayaran berhasil dikonfirmasi",
        _ => "Pembayaran belum diterima",
    };

    Ok(Json(StatusCheckResponse {
        message: message.to_string(),
        status,
    }))
}
