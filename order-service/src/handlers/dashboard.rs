use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::{
    middleware::AuthUser,
    services::dashboard::{DashboardStats, SalesPoint},
    AppState,
};

pub async fn welcome(AuthUser(claims): AuthUser) -> Json<Value> {
    Json(json!({
        "message": "Welcome to the dashboard!",
        "user": {
            "id": claims.sub,
            "email": claims.email,
        }
    }))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.dashboard.stats(Utc::now()).await?))
}

pub async fn sales_chart(
    State(state): State<AppState>,
) -> Result<Json<Vec<SalesPoint>>, AppError> {
    Ok(Json(state.dashboard.sales_chart(Utc::now()).await?))
}
