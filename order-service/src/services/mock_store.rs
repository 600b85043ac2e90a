//! In-memory [`Store`] used by the integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::store::Store;
use crate::models::{
    Category, FulfillmentStatus, NewOrder, NewPayment, NewPaymentMethod, NewProduct, Order,
    OrderDetail, OrderItem, OrderItemDetail, OrderStatusUpdate, Payment, PaymentDetail,
    PaymentMethod, PaymentMethodUpdate, PaymentRecordStatus, PaymentStatus, Product,
    ProductUpdate, ProductWithCategory, User,
};

#[derive(Default)]
struct MockState {
    next_id: i64,
    writes: usize,
    users: Vec<User>,
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    methods: BTreeMap<i64, PaymentMethod>,
    orders: BTreeMap<i64, Order>,
    items: Vec<OrderItem>,
    payments: Vec<Payment>,
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn latest_payment(&self, order_id: i64) -> Option<&Payment> {
        self.payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .max_by_key(|p| (p.paid_at, p.id))
    }

    fn payment_mut(&mut self, payment_id: i64) -> Result<&mut Payment, AppError> {
        self.payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Record not found")))
    }

    fn detail(&self, order: &Order) -> OrderDetail {
        let items = self
            .items
            .iter()
            .filter(|i| i.order_id == order.id)
            .map(|item| OrderItemDetail {
                item: item.clone(),
                product: self.products.get(&item.product_id).cloned(),
            })
            .collect();

        let mut payments: Vec<PaymentDetail> = self
            .payments
            .iter()
            .filter(|p| p.order_id == order.id)
            .map(|payment| PaymentDetail {
                payment: payment.clone(),
                method: self.methods.get(&payment.method_id).cloned(),
            })
            .collect();
        payments.sort_by_key(|p| std::cmp::Reverse((p.payment.paid_at, p.payment.id)));

        OrderDetail {
            order: order.clone(),
            items,
            payments,
        }
    }
}

fn related_records_conflict() -> AppError {
    AppError::Conflict(anyhow::anyhow!("Operation conflicts with related records"))
}

/// Mirrors the PostgreSQL schema's foreign keys so referential errors surface
/// the same way they do against a real database.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>, AppError> {
        self.state
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mock store mutex poisoned: {}", e)))
    }

    /// Number of successful mutating calls so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().map(|s| s.writes).unwrap_or_default()
    }

    pub fn seed_user(&self, email: &str, password_hash: &str) -> User {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let user = User {
            id: state.next_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: Some("Admin".to_string()),
        };
        state.users.push(user.clone());
        user
    }

    /// All payments of an order in insertion order.
    pub fn payments_for(&self, order_id: i64) -> Vec<Payment> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect()
    }

    pub fn items_for(&self, order_id: i64) -> Vec<OrderItem> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Move an order's creation time, for dashboard windows.
    pub fn backdate_order(&self, order_id: i64, created_at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(order) = state.orders.get_mut(&order_id) {
            order.created_at = created_at;
        }
    }
}

#[async_trait]
impl Store for MockStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.lock()?;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.lock()?.categories.values().cloned().collect())
    }

    async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        let mut state = self.lock()?;
        let category = Category {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        state.writes += 1;
        Ok(category)
    }

    async fn update_category(&self, id: i64, name: &str) -> Result<Option<Category>, AppError> {
        let mut state = self.lock()?;
        let Some(category) = state.categories.get_mut(&id) else {
            return Ok(None);
        };
        category.name = name.to_string();
        let category = category.clone();
        state.writes += 1;
        Ok(Some(category))
    }

    async fn delete_category(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let referenced = state.products.values().filter(|p| p.category_id == id).count();
        if referenced > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Category cannot be deleted while {} menu item(s) still use it",
                referenced
            )));
        }
        let removed = state.categories.remove(&id).is_some();
        if removed {
            state.writes += 1;
        }
        Ok(removed)
    }

    async fn list_products(&self) -> Result<Vec<ProductWithCategory>, AppError> {
        let state = self.lock()?;
        Ok(state
            .products
            .values()
            .map(|product| ProductWithCategory {
                product: product.clone(),
                category: state.categories.get(&product.category_id).cloned(),
            })
            .collect())
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        Ok(self.lock()?.products.get(&id).cloned())
    }

    async fn create_product(&self, input: &NewProduct) -> Result<Product, AppError> {
        let mut state = self.lock()?;
        if !state.categories.contains_key(&input.category_id) {
            return Err(related_records_conflict());
        }
        let product = Product {
            id: state.next_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            category_id: input.category_id,
            image_url: input.image_url.clone(),
        };
        state.products.insert(product.id, product.clone());
        state.writes += 1;
        Ok(product)
    }

    async fn update_product(
        &self,
        id: i64,
        input: &ProductUpdate,
    ) -> Result<Option<Product>, AppError> {
        let mut state = self.lock()?;
        if !state.categories.contains_key(&input.category_id) {
            return Err(related_records_conflict());
        }
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        product.name = input.name.clone();
        product.description = input.description.clone();
        product.price = input.price;
        product.category_id = input.category_id;
        if let Some(url) = &input.image_url {
            product.image_url = Some(url.clone());
        }
        let product = product.clone();
        state.writes += 1;
        Ok(Some(product))
    }

    async fn delete_product(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        if state.items.iter().any(|i| i.product_id == id) {
            return Err(related_records_conflict());
        }
        let removed = state.products.remove(&id).is_some();
        if removed {
            state.writes += 1;
        }
        Ok(removed)
    }

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, AppError> {
        Ok(self.lock()?.methods.values().cloned().collect())
    }

    async fn get_payment_method(&self, id: i64) -> Result<Option<PaymentMethod>, AppError> {
        Ok(self.lock()?.methods.get(&id).cloned())
    }

    async fn find_payment_method_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PaymentMethod>, AppError> {
        let state = self.lock()?;
        Ok(state.methods.values().find(|m| m.name == name).cloned())
    }

    async fn create_payment_method(
        &self,
        input: &NewPaymentMethod,
    ) -> Result<PaymentMethod, AppError> {
        let mut state = self.lock()?;
        let method = PaymentMethod {
            id: state.next_id(),
            name: input.name.clone(),
            is_active: input.is_active,
            account_number: None,
            account_holder: None,
            qris_image_url: None,
        };
        state.methods.insert(method.id, method.clone());
        state.writes += 1;
        Ok(method)
    }

    async fn update_payment_method(
        &self,
        id: i64,
        input: &PaymentMethodUpdate,
    ) -> Result<Option<PaymentMethod>, AppError> {
        let mut state = self.lock()?;
        let Some(method) = state.methods.get_mut(&id) else {
            return Ok(None);
        };
        method.name = input.name.clone();
        method.account_number = input.account_number.clone();
        method.account_holder = input.account_holder.clone();
        if let Some(url) = &input.qris_image_url {
            method.qris_image_url = Some(url.clone());
        }
        let method = method.clone();
        state.writes += 1;
        Ok(Some(method))
    }

    async fn delete_payment_method(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        if state.payments.iter().any(|p| p.method_id == id) {
            return Err(related_records_conflict());
        }
        let removed = state.methods.remove(&id).is_some();
        if removed {
            state.writes += 1;
        }
        Ok(removed)
    }

    async fn create_order(&self, input: &NewOrder) -> Result<Order, AppError> {
        let mut state = self.lock()?;

        // Validate every reference up front so a failure leaves no partial order.
        if !state.methods.contains_key(&input.payment_method_id)
            || input
                .items
                .iter()
                .any(|i| !state.products.contains_key(&i.product_id))
        {
            return Err(related_records_conflict());
        }

        let now = Utc::now();
        let order = Order {
            id: state.next_id(),
            customer_name: input.customer_name.clone(),
            customer_contact: input.customer_contact.clone(),
            total: input.total,
            customer_note: input.customer_note.clone(),
            order_type: input.order_type,
            payment_status: input.payment_status,
            fulfillment_status: FulfillmentStatus::Menunggu,
            cancellation_note: None,
            created_at: now,
        };

        for item in &input.items {
            let id = state.next_id();
            state.items.push(OrderItem {
                id,
                order_id: order.id,
                product_id: item.product_id,
                quantity: item.quantity,
                subtotal: item.subtotal,
            });
        }

        let payment_id = state.next_id();
        state.payments.push(Payment {
            id: payment_id,
            order_id: order.id,
            method_id: input.payment_method_id,
            amount: input.total,
            status: input.payment_record_status,
            reference_code: None,
            paid_at: now,
            proof_url: None,
        });

        state.orders.insert(order.id, order.clone());
        state.writes += 1;
        Ok(order)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, AppError> {
        Ok(self.lock()?.orders.get(&id).cloned())
    }

    async fn get_order_detail(&self, id: i64) -> Result<Option<OrderDetail>, AppError> {
        let state = self.lock()?;
        Ok(state.orders.get(&id).map(|order| state.detail(order)))
    }

    async fn list_order_details(&self) -> Result<Vec<OrderDetail>, AppError> {
        let state = self.lock()?;
        let mut orders: Vec<&Order> = state.orders.values().collect();
        orders.sort_by_key(|o| std::cmp::Reverse((o.created_at, o.id)));
        Ok(orders.into_iter().map(|o| state.detail(o)).collect())
    }

    async fn list_orders_by_contact(&self, contact: &str) -> Result<Vec<Order>, AppError> {
        let state = self.lock()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.customer_contact == contact)
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse((o.created_at, o.id)));
        Ok(orders)
    }

    async fn count_orders_with_status(&self, statuses: &[PaymentStatus]) -> Result<i64, AppError> {
        let state = self.lock()?;
        Ok(state
            .orders
            .values()
            .filter(|o| statuses.contains(&o.payment_status))
            .count() as i64)
    }

    async fn set_order_payment_status(
        &self,
        id: i64,
        status: PaymentStatus,
    ) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if let Some(order) = state.orders.get_mut(&id) {
            order.payment_status = status;
            state.writes += 1;
        }
        Ok(())
    }

    async fn mark_order_paid(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if let Some(order) = state.orders.get_mut(&id) {
            order.payment_status = PaymentStatus::Lunas;
            order.fulfillment_status = FulfillmentStatus::PesananDiterima;
            state.writes += 1;
        }
        Ok(())
    }

    async fn update_order_status(
        &self,
        id: i64,
        update: &OrderStatusUpdate,
    ) -> Result<Option<Order>, AppError> {
        let mut state = self.lock()?;
        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(None);
        };
        order.payment_status = update.payment_status;
        if let Some(fulfillment) = update.fulfillment_status {
            order.fulfillment_status = fulfillment;
        }
        order.cancellation_note = update.cancellation_note.clone();
        let order = order.clone();
        state.writes += 1;
        Ok(Some(order))
    }

    async fn latest_payment(&self, order_id: i64) -> Result<Option<Payment>, AppError> {
        let state = self.lock()?;
        Ok(state.latest_payment(order_id).cloned())
    }

    async fn insert_payment(&self, input: &NewPayment) -> Result<Payment, AppError> {
        let mut state = self.lock()?;
        if !state.orders.contains_key(&input.order_id) || !state.methods.contains_key(&input.method_id)
        {
            return Err(related_records_conflict());
        }
        let payment = Payment {
            id: state.next_id(),
            order_id: input.order_id,
            method_id: input.method_id,
            amount: input.amount,
            status: input.status,
            reference_code: input.reference_code.clone(),
            paid_at: Utc::now(),
            proof_url: None,
        };
        state.payments.push(payment.clone());
        state.writes += 1;
        Ok(payment)
    }

    async fn set_payment_proof(&self, payment_id: i64, proof_url: &str) -> Result<(), AppError> {
        let mut state = self.lock()?;
        state.payment_mut(payment_id)?.proof_url = Some(proof_url.to_string());
        state.writes += 1;
        Ok(())
    }

    async fn set_payment_status(
        &self,
        payment_id: i64,
        status: PaymentRecordStatus,
    ) -> Result<(), AppError> {
        let mut state = self.lock()?;
        state.payment_mut(payment_id)?.status = status;
        state.writes += 1;
        Ok(())
    }

    async fn set_payment_method(&self, payment_id: i64, method_id: i64) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if !state.methods.contains_key(&method_id) {
            return Err(related_records_conflict());
        }
        state.payment_mut(payment_id)?.method_id = method_id;
        state.writes += 1;
        Ok(())
    }

    async fn paid_revenue_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Decimal, AppError> {
        let state = self.lock()?;
        Ok(state
            .orders
            .values()
            .filter(|o| {
                o.payment_status == PaymentStatus::Lunas && o.created_at >= from && o.created_at < to
            })
            .map(|o| o.total)
            .sum())
    }

    async fn paid_orders_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, Decimal)>, AppError> {
        let state = self.lock()?;
        let mut rows: Vec<(DateTime<Utc>, Decimal)> = state
            .orders
            .values()
            .filter(|o| o.payment_status == PaymentStatus::Lunas && o.created_at >= since)
            .map(|o| (o.created_at, o.total))
            .collect();
        rows.sort_by_key(|(created_at, _)| *created_at);
        Ok(rows)
    }

    async fn best_selling_product(&self) -> Result<Option<String>, AppError> {
        let state = self.lock()?;
        let mut quantities: HashMap<i64, i64> = HashMap::new();
        for item in &state.items {
            *quantities.entry(item.product_id).or_default() += i64::from(item.quantity);
        }
        Ok(quantities
            .into_iter()
            .max_by_key(|(product_id, quantity)| (*quantity, std::cmp::Reverse(*product_id)))
            .and_then(|(product_id, _)| state.products.get(&product_id))
            .map(|p| p.name.clone()))
    }
}
