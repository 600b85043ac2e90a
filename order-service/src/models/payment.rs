use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;

use super::{decode_error, PaymentMethod};

/// State of a single payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRecordStatus {
    Pending,
    MenungguKonfirmasi,
    Success,
    Failed,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Pending => "PENDING",
            PaymentRecordStatus::MenungguKonfirmasi => "MENUNGGU_KONFIRMASI",
            PaymentRecordStatus::Success => "SUCCESS",
            PaymentRecordStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for PaymentRecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentRecordStatus::Pending),
            "MENUNGGU_KONFIRMASI" => Ok(PaymentRecordStatus::MenungguKonfirmasi),
            "SUCCESS" => Ok(PaymentRecordStatus::Success),
            "FAILED" => Ok(PaymentRecordStatus::Failed),
            _ => Err(format!("Invalid payment record status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    #[serde(rename = "metode_id")]
    pub method_id: i64,
    #[serde(rename = "jumlah_bayar")]
    pub amount: Decimal,
    pub status: PaymentRecordStatus,
    #[serde(rename = "kode_referensi")]
    pub reference_code: Option<String>,
    #[serde(rename = "waktu_bayar")]
    pub paid_at: DateTime<Utc>,
    #[serde(rename = "bukti_pembayaran_url")]
    pub proof_url: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for Payment {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;

        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            method_id: row.try_get("method_id")?,
            amount: row.try_get("amount")?,
            status: status.parse().map_err(|e| decode_error("status", e))?,
            reference_code: row.try_get("reference_code")?,
            paid_at: row.try_get("paid_at")?,
            proof_url: row.try_get("proof_url")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetail {
    #[serde(flatten)]
    pub payment: Payment,
    #[serde(rename = "metodepembayaran")]
    pub method: Option<PaymentMethod>,
}

/// A payment row appended after the order exists (gateway confirmations).
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub method_id: i64,
    pub amount: Decimal,
    pub status: PaymentRecordStatus,
    pub reference_code: Option<String>,
}
