//! Back-office dashboard figures.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;

use super::store::Store;
use crate::models::PaymentStatus;

pub const NO_BEST_SELLER: &str = "Belum ada";
pub const CHART_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub pendapatan_hari_ini: Decimal,
    pub jumlah_pesanan_baru: i64,
    pub menu_terlaris: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesPoint {
    /// Outlet-local date, `YYYY-MM-DD`.
    pub name: String,
    pub total: Decimal,
}

/// Day boundaries follow the outlet's UTC offset, not the server's.
#[derive(Clone)]
pub struct Dashboard {
    store: Arc<dyn Store>,
    offset: FixedOffset,
}

impl Dashboard {
    pub fn new(store: Arc<dyn Store>, offset: FixedOffset) -> Self {
        Self { store, offset }
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    fn start_of(&self, date: NaiveDate) -> Result<DateTime<Utc>, AppError> {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Invalid local midnight for {}", date))
        })?;
        self.offset
            .from_local_datetime(&midnight)
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("Ambiguous local midnight for {}", date))
            })
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let today = self.local_date(now);
        let from = self.start_of(today)?;
        let to = from + Duration::days(1);

        let revenue = self.store.paid_revenue_between(from, to).await?;
        let new_orders = self
            .store
            .count_orders_with_status(&[PaymentStatus::BelumBayar])
            .await?;
        let best_seller = self.store.best_selling_product().await?;

        Ok(DashboardStats {
            pendapatan_hari_ini: revenue,
            jumlah_pesanan_baru: new_orders,
            menu_terlaris: best_seller.unwrap_or_else(|| NO_BEST_SELLER.to_string()),
        })
    }

    /// Paid revenue for today and the six days before it, oldest first.
    pub async fn sales_chart(&self, now: DateTime<Utc>) -> Result<Vec<SalesPoint>, AppError> {
        let today = self.local_date(now);
        let first_day = today - Duration::days(CHART_DAYS - 1);
        let since = self.start_of(first_day)?;

        let mut points: Vec<(NaiveDate, Decimal)> = (0..CHART_DAYS)
            .map(|i| (first_day + Duration::days(i), Decimal::ZERO))
            .collect();

        for (created_at, total) in self.store.paid_orders_since(since).await? {
            let day = self.local_date(created_at);
            if let Some((_, sum)) = points.iter_mut().find(|(d, _)| *d == day) {
                *sum += total;
            }
        }

        Ok(points
            .into_iter()
            .map(|(day, total)| SalesPoint {
                name: day.format("%Y-%m-%d").to_string(),
                total,
            })
            .collect())
    }

    /// Orders a cashier still has to act on.
    pub async fn pending_order_count(&self) -> Result<i64, AppError> {
        self.store
            .count_orders_with_status(&[
                PaymentStatus::BelumBayar,
                PaymentStatus::MenungguKonfirmasi,
            ])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        NewOrder, NewOrderItem, NewPaymentMethod, NewProduct, OrderType, PaymentRecordStatus,
    };
    use crate::services::mock_store::MockStore;

    async fn place(
        store: &MockStore,
        product_id: i64,
        method_id: i64,
        qty: i32,
        status: PaymentStatus,
    ) -> i64 {
        let total = Decimal::new(5000, 0) * Decimal::from(qty);
        store
            .create_order(&NewOrder {
                customer_name: "Sri".to_string(),
                customer_contact: "-".to_string(),
                total,
                customer_note: None,
                order_type: OrderType::Offline,
                payment_status: status,
                items: vec![NewOrderItem {
                    product_id,
                    quantity: qty,
                    subtotal: total,
                }],
                payment_method_id: method_id,
                payment_record_status: PaymentRecordStatus::Pending,
            })
            .await
            .unwrap()
            .id
    }

    async fn seeded() -> (Arc<MockStore>, i64, i64, i64) {
        let store = Arc::new(MockStore::new());
        let category = store.create_category("Makanan").await.unwrap();
        let mut product_ids = Vec::new();
        for name in ["Nasi Goreng", "Mie Ayam"] {
            let product = store
                .create_product(&NewProduct {
                    name: name.to_string(),
                    description: None,
                    price: Decimal::new(5000, 0),
                    category_id: category.id,
                    image_url: None,
                })
                .await
                .unwrap();
            product_ids.push(product.id);
        }
        let method = store
            .create_payment_method(&NewPaymentMethod {
                name: "Cash".to_string(),
                is_active: true,
            })
            .await
            .unwrap();
        (store, product_ids[0], product_ids[1], method.id)
    }

    #[tokio::test]
    async fn empty_store_has_no_best_seller() {
        let store = Arc::new(MockStore::new());
        let dashboard = Dashboard::new(store, FixedOffset::east_opt(7 * 3600).unwrap());

        let stats = dashboard.stats(Utc::now()).await.unwrap();
        assert_eq!(stats.pendapatan_hari_ini, Decimal::ZERO);
        assert_eq!(stats.jumlah_pesanan_baru, 0);
        assert_eq!(stats.menu_terlaris, NO_BEST_SELLER);
    }

    #[tokio::test]
    async fn stats_sum_only_todays_paid_orders() {
        let (store, nasi, mie, cash) = seeded().await;
        let now = Utc::now();
        place(&store, nasi, cash, 1, PaymentStatus::Lunas).await;
        place(&store, mie, cash, 3, PaymentStatus::BelumBayar).await;
        let old = place(&store, nasi, cash, 1, PaymentStatus::Lunas).await;
        store.backdate_order(old, now - Duration::days(3));

        let dashboard = Dashboard::new(store.clone(), FixedOffset::east_opt(0).unwrap());
        let stats = dashboard.stats(now).await.unwrap();

        assert_eq!(stats.pendapatan_hari_ini, Decimal::new(5000, 0));
        assert_eq!(stats.jumlah_pesanan_baru, 1);
        assert_eq!(stats.menu_terlaris, "Mie Ayam");
    }

    #[tokio::test]
    async fn sales_chart_has_seven_buckets_oldest_first() {
        let (store, nasi, _, cash) = seeded().await;
        let now = Utc::now();
        let two_days_ago = place(&store, nasi, cash, 2, PaymentStatus::Lunas).await;
        store.backdate_order(two_days_ago, now - Duration::days(2));
        let too_old = place(&store, nasi, cash, 1, PaymentStatus::Lunas).await;
        store.backdate_order(too_old, now - Duration::days(10));
        place(&store, nasi, cash, 1, PaymentStatus::BelumBayar).await;

        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let dashboard = Dashboard::new(store.clone(), offset);
        let chart = dashboard.sales_chart(now).await.unwrap();

        assert_eq!(chart.len(), 7);
        let today = now.with_timezone(&offset).date_naive();
        assert_eq!(chart[6].name, today.format("%Y-%m-%d").to_string());
        assert_eq!(chart[6].total, Decimal::ZERO);
        assert_eq!(chart[4].total, Decimal::new(10000, 0));
        let sum: Decimal = chart.iter().map(|p| p.total).sum();
        assert_eq!(sum, Decimal::new(10000, 0));
    }

    #[tokio::test]
    async fn pending_count_includes_awaiting_confirmation() {
        let (store, nasi, _, cash) = seeded().await;
        place(&store, nasi, cash, 1, PaymentStatus::BelumBayar).await;
        place(&store, nasi, cash, 1, PaymentStatus::MenungguKonfirmasi).await;
        place(&store, nasi, cash, 1, PaymentStatus::Lunas).await;

        let dashboard = Dashboard::new(store, FixedOffset::east_opt(0).unwrap());
        assert_eq!(dashboard.pending_order_count().await.unwrap(), 2);
    }
}
