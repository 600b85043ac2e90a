use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        CreateOrderRequest, NewOrderCount, OrderLookupQuery, PlacedOrderResponse,
        UpdateOrderStatusRequest,
    },
    models::{Order, OrderDetail},
    services::orders::AdminStatusUpdate,
    utils::ValidatedJson,
    AppState,
};

/// Storefront and cashier checkout.
pub async fn create_order(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), AppError> {
    let placed = state.lifecycle.create_order(payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderResponse {
            order: placed.order,
            payment_url: placed.payment_url,
        }),
    ))
}

pub async fn list_orders_by_contact(
    State(state): State<AppState>,
    Path(nomor_wa): Path<String>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state
        .store
        .list_orders_by_contact(nomor_wa.trim())
        .await?;

    Ok(Json(orders))
}

/// Order detail for the storefront. When `nomorWa` is given it must match the
/// order's contact; a mismatch looks exactly like a missing order.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<OrderLookupQuery>,
) -> Result<Json<OrderDetail>, AppError> {
    let not_found = || AppError::NotFound(anyhow::anyhow!("Order {} not found", id));

    let detail = state
        .store
        .get_order_detail(id)
        .await?
        .ok_or_else(not_found)?;

    if let Some(contact) = query
        .nomor_wa
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        if contact != detail.order.customer_contact {
            tracing::info!(order_id = id, "Order lookup with mismatched contact");
            return Err(not_found());
        }
    }

    Ok(Json(detail))
}

/// Every order with items and payments, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderDetail>>, AppError> {
    Ok(Json(state.store.list_order_details().await?))
}

pub async fn new_order_count(
    State(state): State<AppState>,
) -> Result<Json<NewOrderCount>, AppError> {
    let count = state.dashboard.pending_order_count().await?;
    Ok(Json(NewOrderCount { count }))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, AppError> {
    tracing::info!(
        order_id = id,
        payment_status = payload.status_pembayaran.as_str(),
        "Admin status update"
    );

    let order = state
        .lifecycle
        .update_status(
            id,
            AdminStatusUpdate {
                payment_status: payload.status_pembayaran,
                fulfillment_status: payload.status_pesanan,
                cancellation_note: payload.keterangan_batal,
                payment_method_id: payload.metode_pembayaran_id,
            },
        )
        .await?;

    Ok(Json(order))
}
