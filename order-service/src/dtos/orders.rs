use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::error::AppError;
use std::str::FromStr;
use validator::Validate;

use crate::models::{FulfillmentStatus, Order, OrderType, PaymentStatus};
use crate::services::orders::{CartLine, GatewayNotification, PlaceOrder};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product id.
    pub id: i64,
    pub harga: Decimal,
    pub jumlah: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[serde(rename = "cartItems", default)]
    #[validate(length(min = 1, message = "Cart must not be empty"))]
    pub cart_items: Vec<CartItem>,
    pub nama_pelanggan: Option<String>,
    pub nomor_wa: Option<String>,
    pub total_harga: Decimal,
    pub catatan_pelanggan: Option<String>,
    pub metode_pembayaran_id: Option<i64>,
    pub tipe_pesanan: Option<OrderType>,
}

impl From<CreateOrderRequest> for PlaceOrder {
    fn from(req: CreateOrderRequest) -> Self {
        PlaceOrder {
            items: req
                .cart_items
                .into_iter()
                .map(|item| CartLine {
                    product_id: item.id,
                    unit_price: item.harga,
                    quantity: item.jumlah,
                })
                .collect(),
            customer_name: req.nama_pelanggan,
            customer_contact: req.nomor_wa,
            total: req.total_harga,
            customer_note: req.catatan_pelanggan,
            order_type: req.tipe_pesanan,
            payment_method_id: req.metode_pembayaran_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlacedOrderResponse {
    #[serde(flatten)]
    pub order: Order,
    #[serde(rename = "paymentUrl")]
    pub payment_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLookupQuery {
    #[serde(rename = "nomorWa")]
    pub nomor_wa: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderStatusRequest {
    pub status_pembayaran: PaymentStatus,
    pub status_pesanan: Option<FulfillmentStatus>,
    pub keterangan_batal: Option<String>,
    pub metode_pembayaran_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewOrderCount {
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusCheckResponse {
    pub message: String,
    pub status: PaymentStatus,
}

/// Pakasir notification body. Pakasir sends numbers, but numeric strings are
/// accepted too.
#[derive(Debug, Deserialize, Validate)]
pub struct WebhookRequest {
    pub order_id: Option<Value>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub amount: Option<Value>,
    pub reference: Option<String>,
}

fn number_field<T: FromStr>(value: &Value, name: &str) -> Result<T, AppError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => String::new(),
    };
    text.parse::<T>()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid {}: {}", name, value)))
}

impl WebhookRequest {
    pub fn into_notification(self) -> Result<GatewayNotification, AppError> {
        let order_id = self
            .order_id
            .filter(|v| !v.is_null())
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid payload: order_id is required")))?;
        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid payload: status is required")))?;

        let amount = match self.amount.filter(|v| !v.is_null()) {
            Some(value) => Some(number_field::<Decimal>(&value, "amount")?),
            None => None,
        };

        Ok(GatewayNotification {
            order_id: number_field::<i64>(&order_id, "order_id")?,
            status,
            payment_method: self.payment_method,
            amount,
            reference: self.reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook(body: Value) -> WebhookRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn webhook_accepts_numeric_strings() {
        let notification = webhook(json!({
            "order_id": "42",
            "status": "completed",
            "payment_method": "qris",
            "amount": "20000"
        }))
        .into_notification()
        .unwrap();

        assert_eq!(notification.order_id, 42);
        assert_eq!(notification.amount, Some(Decimal::new(20000, 0)));
        assert_eq!(notification.payment_method.as_deref(), Some("qris"));
    }

    #[test]
    fn webhook_requires_order_id_and_status() {
        assert!(webhook(json!({ "status": "completed" }))
            .into_notification()
            .is_err());
        assert!(webhook(json!({ "order_id": 1 })).into_notification().is_err());
        assert!(webhook(json!({ "order_id": "abc", "status": "completed" }))
            .into_notification()
            .is_err());
    }

    #[test]
    fn create_order_request_reads_storefront_names() {
        let req: CreateOrderRequest = serde_json::from_value(json!({
            "cartItems": [{ "id": 1, "harga": 10000, "jumlah": 2 }],
            "total_harga": 20000,
            "tipe_pesanan": "OFFLINE",
            "metode_pembayaran_id": 3
        }))
        .unwrap();

        let place: PlaceOrder = req.into();
        assert_eq!(place.items.len(), 1);
        assert_eq!(place.items[0].unit_price, Decimal::new(10000, 0));
        assert_eq!(place.order_type, Some(OrderType::Offline));
        assert_eq!(place.payment_method_id, Some(3));
        assert!(place.customer_name.is_none());
    }

    #[test]
    fn filled_cart_passes_validation() {
        let req: CreateOrderRequest = serde_json::from_value(json!({
            "cartItems": [{ "id": 1, "harga": 10000, "jumlah": 2 }],
            "total_harga": 20000,
            "tipe_pesanan": "OFFLINE"
        }))
        .unwrap();

        assert!(req.validate().is_ok());
    }

    #[test]
    fn missing_cart_fails_validation() {
        let req: CreateOrderRequest = serde_json::from_value(json!({
            "total_harga": 0,
            "tipe_pesanan": "ONLINE"
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }
}
