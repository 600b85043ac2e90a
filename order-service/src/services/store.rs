//! Persistence contract for the outlet backend.
//!
//! Handlers and the order lifecycle only talk to `Arc<dyn Store>`, so the
//! PostgreSQL implementation ([`super::Database`]) can be swapped for the
//! in-memory [`super::MockStore`] in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::models::{
    Category, NewOrder, NewPayment, NewPaymentMethod, NewProduct, Order, OrderDetail,
    OrderStatusUpdate, Payment, PaymentMethod, PaymentMethodUpdate, PaymentRecordStatus,
    PaymentStatus, Product, ProductUpdate, ProductWithCategory, User,
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Users

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    // Categories

    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn create_category(&self, name: &str) -> Result<Category, AppError>;
    async fn update_category(&self, id: i64, name: &str) -> Result<Option<Category>, AppError>;
    /// Fails with [`AppError::Conflict`] while any product still references the category.
    async fn delete_category(&self, id: i64) -> Result<bool, AppError>;

    // Products

    async fn list_products(&self) -> Result<Vec<ProductWithCategory>, AppError>;
    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError>;
    async fn create_product(&self, input: &NewProduct) -> Result<Product, AppError>;
    async fn update_product(
        &self,
        id: i64,
        input: &ProductUpdate,
    ) -> Result<Option<Product>, AppError>;
    async fn delete_product(&self, id: i64) -> Result<bool, AppError>;

    // Payment methods

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, AppError>;
    async fn get_payment_method(&self, id: i64) -> Result<Option<PaymentMethod>, AppError>;
    async fn find_payment_method_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PaymentMethod>, AppError>;
    async fn create_payment_method(
        &self,
        input: &NewPaymentMethod,
    ) -> Result<PaymentMethod, AppError>;
    async fn update_payment_method(
        &self,
        id: i64,
        input: &PaymentMethodUpdate,
    ) -> Result<Option<PaymentMethod>, AppError>;
    async fn delete_payment_method(&self, id: i64) -> Result<bool, AppError>;

    // Orders

    /// Insert the order, its items and its initial payment as one unit.
    async fn create_order(&self, input: &NewOrder) -> Result<Order, AppError>;
    async fn get_order(&self, id: i64) -> Result<Option<Order>, AppError>;
    async fn get_order_detail(&self, id: i64) -> Result<Option<OrderDetail>, AppError>;
    /// Every order, newest first.
    async fn list_order_details(&self) -> Result<Vec<OrderDetail>, AppError>;
    async fn list_orders_by_contact(&self, contact: &str) -> Result<Vec<Order>, AppError>;
    async fn count_orders_with_status(&self, statuses: &[PaymentStatus]) -> Result<i64, AppError>;
    async fn set_order_payment_status(
        &self,
        id: i64,
        status: PaymentStatus,
    ) -> Result<(), AppError>;
    /// Payment status `LUNAS` and fulfillment `PESANAN_DITERIMA`.
    async fn mark_order_paid(&self, id: i64) -> Result<(), AppError>;
    async fn update_order_status(
        &self,
        id: i64,
        update: &OrderStatusUpdate,
    ) -> Result<Option<Order>, AppError>;

    // Payments

    /// Authoritative payment of an order: latest `paid_at`, then highest id.
    async fn latest_payment(&self, order_id: i64) -> Result<Option<Payment>, AppError>;
    async fn insert_payment(&self, input: &NewPayment) -> Result<Payment, AppError>;
    async fn set_payment_proof(&self, payment_id: i64, proof_url: &str) -> Result<(), AppError>;
    async fn set_payment_status(
        &self,
        payment_id: i64,
        status: PaymentRecordStatus,
    ) -> Result<(), AppError>;
    async fn set_payment_method(&self, payment_id: i64, method_id: i64) -> Result<(), AppError>;

    // Dashboard aggregates

    /// Sum of `LUNAS` order totals placed in `[from, to)`.
    async fn paid_revenue_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Decimal, AppError>;
    /// `(created_at, total)` of every `LUNAS` order placed at or after `since`.
    async fn paid_orders_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, Decimal)>, AppError>;
    /// Name of the product with the highest ordered quantity.
    async fn best_selling_product(&self) -> Result<Option<String>, AppError>;
}
