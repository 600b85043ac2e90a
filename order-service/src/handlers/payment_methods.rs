use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{CreatePaymentMethodRequest, MessageResponse},
    models::{NewPaymentMethod, PaymentMethod, PaymentMethodUpdate},
    services::storage::{qris_image_key, QRIS_BUCKET},
    utils::{MultipartForm, ValidatedJson},
    AppState,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Payment method {} not found", id))
}

/// Storefront list; safe to cache briefly.
pub async fn list_payment_methods(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let methods = state.store.list_payment_methods().await?;

    Ok((
        [(header::CACHE_CONTROL, "public, max-age=60")],
        Json(methods),
    ))
}

pub async fn create_payment_method(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePaymentMethodRequest>,
) -> Result<(StatusCode, Json<PaymentMethod>), AppError> {
    let method = state
        .store
        .create_payment_method(&NewPaymentMethod {
            name: payload.nama_metode.trim().to_string(),
            is_active: payload.is_active,
        })
        .await?;
    tracing::info!(method_id = method.id, "Payment method created");

    Ok((StatusCode::CREATED, Json(method)))
}

/// Fields: `nama_metode`, `nomor_rekening`, `nama_rekening`, `gambar_qris` (optional).
pub async fn update_payment_method(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<PaymentMethod>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    if state.store.get_payment_method(id).await?.is_none() {
        return Err(not_found(id));
    }

    let name = form.required_text("nama_metode")?;

    let qris_image_url = match form.take_file("gambar_qris") {
        Some(image) => Some(
            state
                .storage
                .upload(
                    QRIS_BUCKET,
                    &qris_image_key(id),
                    image.data,
                    &image.content_type,
                )
                .await?,
        ),
        None => None,
    };

    let method = state
        .store
        .update_payment_method(
            id,
            &PaymentMethodUpdate {
                name,
                account_number: form.text("nomor_rekening"),
                account_holder: form.text("nama_rekening"),
                qris_image_url,
            },
        )
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(method))
}

pub async fn delete_payment_method(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_payment_method(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(method_id = id, "Payment method deleted");

    Ok(Json(MessageResponse::new("Data berhasil dihapus")))
}
