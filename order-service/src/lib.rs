pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use services::{Dashboard, JwtService, ObjectStorage, OrderLifecycle, Store};
use utils::multipart::MAX_UPLOAD_BYTES;

pub use startup::Application;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub storage: Arc<dyn ObjectStorage>,
    pub lifecycle: OrderLifecycle,
    pub dashboard: Dashboard,
    pub jwt: JwtService,
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    use handlers::{categories, dashboard, menu, orders, payment_methods};

    Router::new()
        .route("/dashboard", get(dashboard::welcome))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/sales-chart", get(dashboard::sales_chart))
        .route("/menu", post(menu::create_menu_item))
        .route(
            "/menu/:id",
            put(menu::update_menu_item).delete(menu::delete_menu_item),
        )
        .route("/kategori", post(categories::create_category))
        .route(
            "/kategori/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/metode-pembayaran",
            post(payment_methods::create_payment_method),
        )
        .route(
            "/metode-pembayaran/:id",
            put(payment_methods::update_payment_method)
                .delete(payment_methods::delete_payment_method),
        )
        .route("/orders", get(orders::list_orders))
        .route("/orders/new-count", get(orders::new_order_count))
        .route("/orders/:id", patch(orders::update_order_status))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
}

fn public_routes() -> Router<AppState> {
    use handlers::{categories, menu, orders, payment_methods, payments};

    Router::new()
        .route("/menu", get(menu::list_menu))
        .route("/menu/:id", get(menu::get_menu_item))
        .route("/kategori", get(categories::list_categories))
        .route(
            "/metode-pembayaran",
            get(payment_methods::list_payment_methods),
        )
        .route("/orders", post(orders::create_order))
        .route("/orders/by-wa/:nomor_wa", get(orders::list_orders_by_contact))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/check-status", get(payments::check_status))
        .route(
            "/konfirmasi-pembayaran/:order_id",
            post(payments::upload_payment_proof),
        )
        .route("/webhook/pakasir", post(payments::pakasir_webhook))
}

/// Build the full HTTP surface. `local_files` serves a `LocalStorage`
/// directory under `/files`.
pub fn build_router(state: AppState, local_files: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/api/auth/login", post(handlers::auth::login))
        .nest("/api/admin", admin_routes(&state))
        .nest("/api/public", public_routes());

    if let Some(dir) = local_files {
        router = router.nest_service("/files", ServeDir::new(dir));
    }

    router
        // Multipart framing on top of the largest accepted file.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}
