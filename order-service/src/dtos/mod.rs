//! Request and response bodies. Field names follow the storefront client.

pub mod auth;
pub mod catalog;
pub mod orders;

pub use auth::{LoginRequest, LoginResponse};
pub use catalog::{CategoryRequest, CreatePaymentMethodRequest};
pub use orders::{
    CartItem, CreateOrderRequest, NewOrderCount, OrderLookupQuery, PlacedOrderResponse,
    StatusCheckResponse, UpdateOrderStatusRequest, WebhookRequest,
};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
