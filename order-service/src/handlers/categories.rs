use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{CategoryRequest, MessageResponse},
    models::Category,
    utils::ValidatedJson,
    AppState,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Category {} not found", id))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.store.list_categories().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = state
        .store
        .create_category(payload.nama_kategori.trim())
        .await?;
    tracing::info!(category_id = category.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let category = state
        .store
        .update_category(id, payload.nama_kategori.trim())
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(category))
}

/// Refused with 400 while any menu item still belongs to the category.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_category(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(category_id = id, "Category deleted");

    Ok(Json(MessageResponse::new("Data berhasil dihapus")))
}
