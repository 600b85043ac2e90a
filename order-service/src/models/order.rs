//! Order model and its status enums.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;

use super::{decode_error, PaymentDetail, Product};

/// Where the order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Online,
    Offline,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Online => "ONLINE",
            OrderType::Offline => "OFFLINE",
        }
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(OrderType::Online),
            "OFFLINE" => Ok(OrderType::Offline),
            _ => Err(format!("Invalid order type: {}", s)),
        }
    }
}

/// Payment state of an order as shown to the customer and the cashier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Not yet paid.
    BelumBayar,
    /// Proof uploaded, waiting for a cashier to confirm.
    MenungguKonfirmasi,
    /// Paid in full.
    Lunas,
    /// Cancelled.
    Batal,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::BelumBayar => "BELUM_BAYAR",
            PaymentStatus::MenungguKonfirmasi => "MENUNGGU_KONFIRMASI",
            PaymentStatus::Lunas => "LUNAS",
            PaymentStatus::Batal => "BATAL",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BELUM_BAYAR" => Ok(PaymentStatus::BelumBayar),
            "MENUNGGU_KONFIRMASI" => Ok(PaymentStatus::MenungguKonfirmasi),
            "LUNAS" => Ok(PaymentStatus::Lunas),
            "BATAL" => Ok(PaymentStatus::Batal),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Kitchen-side progress of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    Menunggu,
    PesananDiterima,
    Diproses,
    Siap,
    Selesai,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Menunggu => "MENUNGGU",
            FulfillmentStatus::PesananDiterima => "PESANAN_DITERIMA",
            FulfillmentStatus::Diproses => "DIPROSES",
            FulfillmentStatus::Siap => "SIAP",
            FulfillmentStatus::Selesai => "SELESAI",
        }
    }
}

impl FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MENUNGGU" => Ok(FulfillmentStatus::Menunggu),
            "PESANAN_DITERIMA" => Ok(FulfillmentStatus::PesananDiterima),
            "DIPROSES" => Ok(FulfillmentStatus::Diproses),
            "SIAP" => Ok(FulfillmentStatus::Siap),
            "SELESAI" => Ok(FulfillmentStatus::Selesai),
            _ => Err(format!("Invalid fulfillment status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "nama_pelanggan")]
    pub customer_name: String,
    #[serde(rename = "nomor_wa")]
    pub customer_contact: String,
    #[serde(rename = "total_harga")]
    pub total: Decimal,
    #[serde(rename = "catatan_pelanggan")]
    pub customer_note: Option<String>,
    #[serde(rename = "tipe_pesanan")]
    pub order_type: OrderType,
    #[serde(rename = "status_pembayaran")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "status_pesanan")]
    pub fulfillment_status: FulfillmentStatus,
    #[serde(rename = "keterangan_batal")]
    pub cancellation_note: Option<String>,
    #[serde(rename = "waktu_order")]
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let order_type: String = row.try_get("order_type")?;
        let payment_status: String = row.try_get("payment_status")?;
        let fulfillment_status: String = row.try_get("fulfillment_status")?;

        Ok(Self {
            id: row.try_get("id")?,
            customer_name: row.try_get("customer_name")?,
            customer_contact: row.try_get("customer_contact")?,
            total: row.try_get("total")?,
            customer_note: row.try_get("customer_note")?,
            order_type: order_type
                .parse()
                .map_err(|e| decode_error("order_type", e))?,
            payment_status: payment_status
                .parse()
                .map_err(|e| decode_error("payment_status", e))?,
            fulfillment_status: fulfillment_status
                .parse()
                .map_err(|e| decode_error("fulfillment_status", e))?,
            cancellation_note: row.try_get("cancellation_note")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// One cart line, priced at the moment the order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    #[serde(rename = "produk_id")]
    pub product_id: i64,
    #[serde(rename = "jumlah")]
    pub quantity: i32,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    #[serde(rename = "produk")]
    pub product: Option<Product>,
}

/// Order with its items and its payments, newest payment first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    #[serde(rename = "orderitems")]
    pub items: Vec<OrderItemDetail>,
    #[serde(rename = "pembayaran")]
    pub payments: Vec<PaymentDetail>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// Everything written by the atomic order-creation step.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_contact: String,
    pub total: Decimal,
    pub customer_note: Option<String>,
    pub order_type: OrderType,
    pub payment_status: PaymentStatus,
    pub items: Vec<NewOrderItem>,
    pub payment_method_id: i64,
    pub payment_record_status: super::PaymentRecordStatus,
}

/// Administrative overwrite of an order's statuses.
#[derive(Debug, Clone)]
pub struct OrderStatusUpdate {
    pub payment_status: PaymentStatus,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub cancellation_note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_round_trips_through_its_column_text() {
        for status in [
            PaymentStatus::BelumBayar,
            PaymentStatus::MenungguKonfirmasi,
            PaymentStatus::Lunas,
            PaymentStatus::Batal,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
        }
        assert!("PAID".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn serde_names_match_column_text() {
        let json = serde_json::to_value(FulfillmentStatus::PesananDiterima).unwrap();
        assert_eq!(json, FulfillmentStatus::PesananDiterima.as_str());

        let json = serde_json::to_value(PaymentStatus::MenungguKonfirmasi).unwrap();
        assert_eq!(json, "MENUNGGU_KONFIRMASI");
    }

    #[test]
    fn order_type_rejects_lowercase() {
        assert_eq!("OFFLINE".parse::<OrderType>(), Ok(OrderType::Offline));
        assert!("offline".parse::<OrderType>().is_err());
    }
}
