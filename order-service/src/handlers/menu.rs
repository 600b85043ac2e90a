//! Menu items. Writes are multipart so the product photo travels with the form.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::MessageResponse,
    models::{NewProduct, Product, ProductUpdate, ProductWithCategory},
    services::storage::{product_image_key, upload_key, MENU_BUCKET},
    utils::MultipartForm,
    AppState,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Menu item {} not found", id))
}

async fn require_category(state: &AppState, category_id: i64) -> Result<(), AppError> {
    let exists = state
        .store
        .list_categories()
        .await?
        .iter()
        .any(|c| c.id == category_id);
    if !exists {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Category {} does not exist",
            category_id
        )));
    }
    Ok(())
}

pub async fn list_menu(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductWithCategory>>, AppError> {
    Ok(Json(state.store.list_products().await?))
}

pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(product))
}

/// Fields: `nama_produk`, `deskripsi`, `harga`, `kategori_id`, `gambar` (required).
pub async fn create_menu_item(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let image = form
        .take_file("gambar")
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Tidak ada gambar yang diupload")))?;
    let name = form.required_text("nama_produk")?;
    let price = form.decimal("harga")?;
    let category_id: i64 = form.required("kategori_id")?;
    require_category(&state, category_id).await?;

    let image_url = state
        .storage
        .upload(
            MENU_BUCKET,
            &upload_key(&image.filename),
            image.data,
            &image.content_type,
        )
        .await?;

    let product = state
        .store
        .create_product(&NewProduct {
            name,
            description: form.text("deskripsi"),
            price,
            category_id,
            image_url: Some(image_url),
        })
        .await?;
    tracing::info!(product_id = product.id, "Menu item created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Same fields as create; `gambar` is optional and replaces the stored photo.
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Product>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    if state.store.get_product(id).await?.is_none() {
        return Err(not_found(id));
    }

    let name = form.required_text("nama_produk")?;
    let price = form.decimal("harga")?;
    let category_id: i64 = form.required("kategori_id")?;
    require_category(&state, category_id).await?;

    let image_url = match form.take_file("gambar") {
        Some(image) => Some(
            state
                .storage
                .upload(
                    MENU_BUCKET,
                    &product_image_key(id),
                    image.data,
                    &image.content_type,
                )
                .await?,
        ),
        None => None,
    };

    let product = state
        .store
        .update_product(
            id,
            &ProductUpdate {
                name,
                description: form.text("deskripsi"),
                price,
                category_id,
                image_url,
            },
        )
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(product))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_product(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(product_id = id, "Menu item deleted");

    Ok(Json(MessageResponse::new("Produk berhasil dihapus")))
}
