//! PostgreSQL implementation of [`Store`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};

use super::metrics::db_timer;
use super::store::Store;
use crate::models::{
    Category, NewOrder, NewPayment, NewPaymentMethod, NewProduct, Order, OrderDetail, OrderItem,
    OrderItemDetail, OrderStatusUpdate, Payment, PaymentDetail, PaymentMethod,
    PaymentMethodUpdate, PaymentRecordStatus, PaymentStatus, Product, ProductUpdate,
    ProductWithCategory, User,
};

const ORDER_COLUMNS: &str = "id, customer_name, customer_contact, total, customer_note, \
     order_type, payment_status, fulfillment_status, cancellation_note, created_at";

const PAYMENT_COLUMNS: &str =
    "id, order_id, method_id, amount, status, reference_code, paid_at, proof_url";

const PRODUCT_COLUMNS: &str = "id, name, description, price, category_id, image_url";

const METHOD_COLUMNS: &str =
    "id, name, is_active, account_number, account_holder, qris_image_url";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "order-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Load items (with products) and payments (with methods) for a batch of orders.
    async fn attach_details(&self, orders: Vec<Order>) -> Result<Vec<OrderDetail>, AppError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, quantity, subtotal FROM order_items \
             WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<i64, Product> = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(&product_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ANY($1) \
             ORDER BY paid_at DESC, id DESC"
        ))
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let methods: HashMap<i64, PaymentMethod> = self
            .list_payment_methods()
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut items_by_order: HashMap<i64, Vec<OrderItemDetail>> = HashMap::new();
        for item in items {
            let product = products.get(&item.product_id).cloned();
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderItemDetail { item, product });
        }

        let mut payments_by_order: HashMap<i64, Vec<PaymentDetail>> = HashMap::new();
        for payment in payments {
            let method = methods.get(&payment.method_id).cloned();
            payments_by_order
                .entry(payment.order_id)
                .or_default()
                .push(PaymentDetail { payment, method });
        }

        Ok(orders
            .into_iter()
            .map(|order| OrderDetail {
                items: items_by_order.remove(&order.id).unwrap_or_default(),
                payments: payments_by_order.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }
}

#[async_trait]
impl Store for Database {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        info!(category_id = category.id, "Category created");

        Ok(category)
    }

    #[instrument(skip(self))]
    async fn update_category(&self, id: i64, name: &str) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: i64) -> Result<bool, AppError> {
        let (referenced,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if referenced > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Category cannot be deleted while {} menu item(s) still use it",
                referenced
            )));
        }

        // A product inserted between the check and the delete still trips the
        // foreign key, which maps to Conflict as well.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<ProductWithCategory>, AppError> {
        let _timer = db_timer("list_products");

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let categories: HashMap<i64, Category> = self
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(products
            .into_iter()
            .map(|product| ProductWithCategory {
                category: categories.get(&product.category_id).cloned(),
                product,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_product(&self, input: &NewProduct) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, description, price, category_id, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id)
        .bind(&input.image_url)
        .fetch_one(&self.pool)
        .await?;

        info!(product_id = product.id, "Product created");

        Ok(product)
    }

    #[instrument(skip(self, input))]
    async fn update_product(
        &self,
        id: i64,
        input: &ProductUpdate,
    ) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET name = $2, description = $3, price = $4, category_id = $5, \
             image_url = COALESCE($6, image_url) WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id)
        .bind(&input.image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Payment methods
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, AppError> {
        let methods = sqlx::query_as::<_, PaymentMethod>(&format!(
            "SELECT {METHOD_COLUMNS} FROM payment_methods ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    #[instrument(skip(self))]
    async fn get_payment_method(&self, id: i64) -> Result<Option<PaymentMethod>, AppError> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "SELECT {METHOD_COLUMNS} FROM payment_methods WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    #[instrument(skip(self))]
    async fn find_payment_method_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PaymentMethod>, AppError> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "SELECT {METHOD_COLUMNS} FROM payment_methods WHERE name = $1 ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_payment_method(
        &self,
        input: &NewPaymentMethod,
    ) -> Result<PaymentMethod, AppError> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "INSERT INTO payment_methods (name, is_active) VALUES ($1, $2) \
             RETURNING {METHOD_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?;

        info!(method_id = method.id, "Payment method created");

        Ok(method)
    }

    #[instrument(skip(self, input))]
    async fn update_payment_method(
        &self,
        id: i64,
        input: &PaymentMethodUpdate,
    ) -> Result<Option<PaymentMethod>, AppError> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "UPDATE payment_methods SET name = $2, account_number = $3, account_holder = $4, \
             qris_image_url = COALESCE($5, qris_image_url) WHERE id = $1 \
             RETURNING {METHOD_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.account_number)
        .bind(&input.account_holder)
        .bind(&input.qris_image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    #[instrument(skip(self))]
    async fn delete_payment_method(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(order_type = input.order_type.as_str(), items = input.items.len()))]
    async fn create_order(&self, input: &NewOrder) -> Result<Order, AppError> {
        let _timer = db_timer("create_order");

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (customer_name, customer_contact, total, customer_note, \
             order_type, payment_status) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&input.customer_name)
        .bind(&input.customer_contact)
        .bind(input.total)
        .bind(&input.customer_note)
        .bind(input.order_type.as_str())
        .bind(input.payment_status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, subtotal) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO payments (order_id, method_id, amount, status) VALUES ($1, $2, $3, $4)",
        )
        .bind(order.id)
        .bind(input.payment_method_id)
        .bind(input.total)
        .bind(input.payment_record_status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        info!(order_id = order.id, "Order created");

        Ok(order)
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: i64) -> Result<Option<Order>, AppError> {
        let _timer = db_timer("get_order");

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    #[instrument(skip(self))]
    async fn get_order_detail(&self, id: i64) -> Result<Option<OrderDetail>, AppError> {
        let Some(order) = self.get_order(id).await? else {
            return Ok(None);
        };

        Ok(self.attach_details(vec![order]).await?.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn list_order_details(&self) -> Result<Vec<OrderDetail>, AppError> {
        let _timer = db_timer("list_order_details");

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.attach_details(orders).await
    }

    #[instrument(skip(self))]
    async fn list_orders_by_contact(&self, contact: &str) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_contact = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(contact)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    #[instrument(skip(self))]
    async fn count_orders_with_status(&self, statuses: &[PaymentStatus]) -> Result<i64, AppError> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE payment_status = ANY($1)")
                .bind(&statuses)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn set_order_payment_status(
        &self,
        id: i64,
        status: PaymentStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE orders SET payment_status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_order_paid(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE orders SET payment_status = 'LUNAS', fulfillment_status = 'PESANAN_DITERIMA' \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, update), fields(payment_status = update.payment_status.as_str()))]
    async fn update_order_status(
        &self,
        id: i64,
        update: &OrderStatusUpdate,
    ) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET payment_status = $2, \
             fulfillment_status = COALESCE($3, fulfillment_status), cancellation_note = $4 \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.payment_status.as_str())
        .bind(update.fulfillment_status.map(|s| s.as_str()))
        .bind(&update.cancellation_note)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn latest_payment(&self, order_id: i64) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 \
             ORDER BY paid_at DESC, id DESC LIMIT 1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    #[instrument(skip(self, input), fields(order_id = input.order_id, status = input.status.as_str()))]
    async fn insert_payment(&self, input: &NewPayment) -> Result<Payment, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (order_id, method_id, amount, status, reference_code) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(input.order_id)
        .bind(input.method_id)
        .bind(input.amount)
        .bind(input.status.as_str())
        .bind(&input.reference_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    #[instrument(skip(self, proof_url))]
    async fn set_payment_proof(&self, payment_id: i64, proof_url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE payments SET proof_url = $2 WHERE id = $1")
            .bind(payment_id)
            .bind(proof_url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_payment_status(
        &self,
        payment_id: i64,
        status: PaymentRecordStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE payments SET status = $2 WHERE id = $1")
            .bind(payment_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_payment_method(&self, payment_id: i64, method_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE payments SET method_id = $2 WHERE id = $1")
            .bind(payment_id)
            .bind(method_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Dashboard aggregates
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn paid_revenue_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Decimal, AppError> {
        let (revenue,): (Option<Decimal>,) = sqlx::query_as(
            "SELECT SUM(total) FROM orders WHERE payment_status = 'LUNAS' \
             AND created_at >= $1 AND created_at < $2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(revenue.unwrap_or(Decimal::ZERO))
    }

    #[instrument(skip(self))]
    async fn paid_orders_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, Decimal)>, AppError> {
        let rows: Vec<(DateTime<Utc>, Decimal)> = sqlx::query_as(
            "SELECT created_at, total FROM orders WHERE payment_status = 'LUNAS' \
             AND created_at >= $1 ORDER BY created_at",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn best_selling_product(&self) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT p.name FROM order_items oi JOIN products p ON p.id = oi.product_id \
             GROUP BY p.id, p.name ORDER BY SUM(oi.quantity) DESC, p.id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(name,)| name))
    }
}
