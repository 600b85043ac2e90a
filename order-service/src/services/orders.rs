//! Order and payment lifecycle.
//!
//! Owns the status rules shared by checkout, proof upload, the Pakasir
//! webhook, status polling and the cashier's manual override:
//!
//! - walk-in (`OFFLINE`) orders paid with the cash method are settled on creation
//! - a completed gateway transaction moves the order to `LUNAS` /
//!   `PESANAN_DITERIMA`, and applying it again changes nothing visible
//! - the most recent payment (by `paid_at`, then id) is the one that counts

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::metrics::{record_order_created, record_payment_confirmation};
use super::pakasir::{GatewayStatus, PaymentGateway};
use super::storage::{upload_key, ObjectStorage, PROOF_BUCKET};
use super::store::Store;
use crate::models::{
    FulfillmentStatus, NewOrder, NewOrderItem, NewPayment, NewPaymentMethod, Order,
    OrderStatusUpdate, OrderType, Payment, PaymentMethod, PaymentRecordStatus, PaymentStatus,
    PAKASIR_METHOD_NAME,
};

pub const DEFAULT_CUSTOMER_NAME: &str = "Pelanggan di Tempat";
pub const DEFAULT_CUSTOMER_CONTACT: &str = "-";
pub const DEFAULT_CANCELLATION_NOTE: &str = "Dibatalkan oleh admin.";

const WEBHOOK_COMPLETED: &str = "completed";
const WEBHOOK_FAILED: &str = "failed";

#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: i64,
    /// Unit price as shown to the customer; trusted as sent.
    pub unit_price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub items: Vec<CartLine>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub total: Decimal,
    pub customer_note: Option<String>,
    pub order_type: Option<OrderType>,
    pub payment_method_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    /// Hosted checkout page, only for unpaid online orders.
    pub payment_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Notification pushed by the gateway.
#[derive(Debug, Clone)]
pub struct GatewayNotification {
    pub order_id: i64,
    pub status: String,
    /// Channel label such as `qris` or `bni_va`.
    pub payment_method: Option<String>,
    pub amount: Option<Decimal>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Paid,
    Cancelled,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct AdminStatusUpdate {
    pub payment_status: PaymentStatus,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub cancellation_note: Option<String>,
    pub payment_method_id: Option<i64>,
}

#[derive(Clone)]
pub struct OrderLifecycle {
    store: Arc<dyn Store>,
    storage: Arc<dyn ObjectStorage>,
    gateway: Arc<dyn PaymentGateway>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Amounts sent to the gateway are whole rupiah, rounded up.
pub fn gateway_amount(total: Decimal) -> Result<i64, AppError> {
    total
        .ceil()
        .to_i64()
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Order total out of range: {}", total)))
}

impl OrderLifecycle {
    pub fn new(
        store: Arc<dyn Store>,
        storage: Arc<dyn ObjectStorage>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            store,
            storage,
            gateway,
        }
    }

    /// Find the gateway's payment method, creating it on first use.
    ///
    /// Two concurrent first uses can both create it; later lookups pick the
    /// lowest id.
    pub async fn pakasir_method(&self) -> Result<PaymentMethod, AppError> {
        if let Some(method) = self
            .store
            .find_payment_method_by_name(PAKASIR_METHOD_NAME)
            .await?
        {
            return Ok(method);
        }

        info!("Provisioning Pakasir payment method");
        self.store
            .create_payment_method(&NewPaymentMethod {
                name: PAKASIR_METHOD_NAME.to_string(),
                is_active: true,
            })
            .await
    }

    async fn require_order(&self, order_id: i64) -> Result<Order, AppError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order {} not found", order_id)))
    }

    #[instrument(skip(self, input), fields(order_type = ?input.order_type, items = input.items.len()))]
    pub async fn create_order(&self, input: PlaceOrder) -> Result<PlacedOrder, AppError> {
        if input.items.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("Cart must not be empty")));
        }
        let order_type = input
            .order_type
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("tipe_pesanan is required")))?;
        if let Some(line) = input.items.iter().find(|l| l.quantity <= 0) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Quantity for product {} must be positive",
                line.product_id
            )));
        }
        if input.total.is_sign_negative()
            || input.items.iter().any(|l| l.unit_price.is_sign_negative())
        {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Prices must not be negative"
            )));
        }

        let method = match input.payment_method_id {
            Some(id) => Some(self.store.get_payment_method(id).await?.ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Invalid payment method"))
            })?),
            None if order_type == OrderType::Online => Some(self.pakasir_method().await?),
            None => None,
        };
        let method = method
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Payment method is required")))?;

        let mut seen = HashSet::new();
        for line in &input.items {
            if seen.insert(line.product_id)
                && self.store.get_product(line.product_id).await?.is_none()
            {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Product {} does not exist",
                    line.product_id
                )));
            }
        }

        let (payment_status, payment_record_status) =
            if order_type == OrderType::Offline && method.is_cash() {
                (PaymentStatus::Lunas, PaymentRecordStatus::Success)
            } else {
                (PaymentStatus::BelumBayar, PaymentRecordStatus::Pending)
            };

        let new_order = NewOrder {
            customer_name: non_blank(input.customer_name)
                .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
            customer_contact: non_blank(input.customer_contact)
                .unwrap_or_else(|| DEFAULT_CUSTOMER_CONTACT.to_string()),
            total: input.total,
            customer_note: non_blank(input.customer_note),
            order_type,
            payment_status,
            items: input
                .items
                .iter()
                .map(|line| NewOrderItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    subtotal: line.unit_price * Decimal::from(line.quantity),
                })
                .collect(),
            payment_method_id: method.id,
            payment_record_status,
        };

        let order = self.store.create_order(&new_order).await?;

        record_order_created(order.order_type.as_str(), order.payment_status.as_str());

        let payment_url = if order.order_type == OrderType::Online
            && order.payment_status == PaymentStatus::BelumBayar
        {
            Some(
                self.gateway
                    .checkout_url(order.id, gateway_amount(order.total)?),
            )
        } else {
            None
        };

        info!(
            order_id = order.id,
            payment_status = order.payment_status.as_str(),
            method = %method.name,
            "Order placed"
        );

        Ok(PlacedOrder { order, payment_url })
    }

    /// Attach a transfer receipt to the order's latest payment and mark both
    /// as awaiting confirmation.
    ///
    /// The URL is written before the status flip; a failure in between leaves
    /// the receipt attached to a still-pending payment and a re-upload finishes
    /// the job.
    #[instrument(skip(self, contact, proof), fields(size = proof.data.len()))]
    pub async fn record_payment_proof(
        &self,
        order_id: i64,
        contact: Option<&str>,
        proof: ProofUpload,
    ) -> Result<Payment, AppError> {
        let order = self.require_order(order_id).await?;

        if let Some(contact) = contact.map(str::trim).filter(|c| !c.is_empty()) {
            if contact != order.customer_contact {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Order {} not found",
                    order_id
                )));
            }
        }

        let payment = self.store.latest_payment(order_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No payment recorded for order {}", order_id))
        })?;

        let key = upload_key(&proof.filename);
        let url = self
            .storage
            .upload(PROOF_BUCKET, &key, proof.data, &proof.content_type)
            .await?;

        self.store.set_payment_proof(payment.id, &url).await?;
        self.store
            .set_payment_status(payment.id, PaymentRecordStatus::MenungguKonfirmasi)
            .await?;
        self.store
            .set_order_payment_status(order_id, PaymentStatus::MenungguKonfirmasi)
            .await?;

        record_payment_confirmation("proof", "uploaded");
        info!(order_id, payment_id = payment.id, "Payment proof recorded");

        Ok(Payment {
            proof_url: Some(url),
            status: PaymentRecordStatus::MenungguKonfirmasi,
            ..payment
        })
    }

    #[instrument(skip(self, notification), fields(order_id = notification.order_id, status = %notification.status))]
    pub async fn confirm_via_webhook(
        &self,
        notification: GatewayNotification,
    ) -> Result<WebhookOutcome, AppError> {
        let order = self.require_order(notification.order_id).await?;

        // Only these two literals change state; Pakasir sends others as progress.
        match notification.status.as_str() {
            WEBHOOK_COMPLETED => {
                self.store.mark_order_paid(order.id).await?;

                let method = self.pakasir_method().await?;
                self.store
                    .insert_payment(&NewPayment {
                        order_id: order.id,
                        method_id: method.id,
                        amount: notification.amount.unwrap_or(order.total),
                        status: PaymentRecordStatus::Success,
                        reference_code: notification.reference.or(notification.payment_method),
                    })
                    .await?;

                record_payment_confirmation("webhook", "completed");
                info!(order_id = order.id, "Order paid via Pakasir webhook");
                Ok(WebhookOutcome::Paid)
            }
            WEBHOOK_FAILED => {
                if order.payment_status == PaymentStatus::Lunas {
                    warn!(order_id = order.id, "Failure notification cancels a paid order");
                }
                self.store
                    .set_order_payment_status(order.id, PaymentStatus::Batal)
                    .await?;

                record_payment_confirmation("webhook", "failed");
                Ok(WebhookOutcome::Cancelled)
            }
            _ => {
                info!(order_id = order.id, "Webhook status acknowledged without change");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    /// Current payment status, asking the gateway only when the order is not
    /// yet paid.
    #[instrument(skip(self))]
    pub async fn poll_status(&self, order_id: i64) -> Result<PaymentStatus, AppError> {
        let order = self.require_order(order_id).await?;

        if order.payment_status == PaymentStatus::Lunas {
            return Ok(PaymentStatus::Lunas);
        }

        let status = self
            .gateway
            .transaction_status(order.id, gateway_amount(order.total)?)
            .await?;

        if status != GatewayStatus::Completed {
            return Ok(order.payment_status);
        }

        self.store.mark_order_paid(order.id).await?;

        match self.store.latest_payment(order.id).await? {
            Some(payment) => {
                self.store
                    .set_payment_status(payment.id, PaymentRecordStatus::Success)
                    .await?;
            }
            None => {
                let method = self.pakasir_method().await?;
                self.store
                    .insert_payment(&NewPayment {
                        order_id: order.id,
                        method_id: method.id,
                        amount: order.total,
                        status: PaymentRecordStatus::Success,
                        reference_code: None,
                    })
                    .await?;
            }
        }

        record_payment_confirmation("poll", "completed");
        info!(order_id = order.id, "Order paid, confirmed by status poll");

        Ok(PaymentStatus::Lunas)
    }

    /// Cashier override. Any status may move to any other.
    #[instrument(skip(self, update), fields(payment_status = update.payment_status.as_str()))]
    pub async fn update_status(
        &self,
        order_id: i64,
        update: AdminStatusUpdate,
    ) -> Result<Order, AppError> {
        self.require_order(order_id).await?;

        if let Some(method_id) = update.payment_method_id {
            if self.store.get_payment_method(method_id).await?.is_none() {
                return Err(AppError::BadRequest(anyhow::anyhow!("Invalid payment method")));
            }
            if let Some(payment) = self.store.latest_payment(order_id).await? {
                self.store.set_payment_method(payment.id, method_id).await?;
            }
        }

        let cancellation_note = if update.payment_status == PaymentStatus::Batal {
            Some(
                non_blank(update.cancellation_note)
                    .unwrap_or_else(|| DEFAULT_CANCELLATION_NOTE.to_string()),
            )
        } else {
            None
        };

        let order = self
            .store
            .update_order_status(
                order_id,
                &OrderStatusUpdate {
                    payment_status: update.payment_status,
                    fulfillment_status: update.fulfillment_status,
                    cancellation_note,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order {} not found", order_id)))?;

        if order.payment_status == PaymentStatus::Lunas {
            record_payment_confirmation("admin", "paid");
        }

        Ok(order)
    }
}
