//! Runs against a real PostgreSQL. Set `TEST_DATABASE_URL` and run with
//! `--ignored`.

use order_service::models::{
    NewOrder, NewOrderItem, NewPayment, NewPaymentMethod, NewProduct, OrderType,
    PaymentRecordStatus, PaymentStatus,
};
use order_service::services::{Database, Store};
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

async fn database() -> Database {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let db = Database::new(&url, 2, 1).await.expect("Failed to connect");
    db.run_migrations().await.expect("Failed to migrate");
    db
}

#[tokio::test]
#[ignore]
async fn order_is_created_atomically_and_settled() {
    let db = database().await;
    let suffix = Uuid::new_v4().simple().to_string();

    let category = db
        .create_category(&format!("Makanan {}", suffix))
        .await
        .unwrap();
    let product = db
        .create_product(&NewProduct {
            name: format!("Nasi Goreng {}", suffix),
            description: None,
            price: Decimal::new(10000, 0),
            category_id: category.id,
            image_url: None,
        })
        .await
        .unwrap();
    let method = db
        .create_payment_method(&NewPaymentMethod {
            name: format!("Transfer {}", suffix),
            is_active: true,
        })
        .await
        .unwrap();

    let order = db
        .create_order(&NewOrder {
            customer_name: "Budi".to_string(),
            customer_contact: format!("08{}", &suffix[..8]),
            total: Decimal::new(20000, 0),
            customer_note: None,
            order_type: OrderType::Online,
            payment_status: PaymentStatus::BelumBayar,
            items: vec![NewOrderItem {
                product_id: product.id,
                quantity: 2,
                subtotal: Decimal::new(20000, 0),
            }],
            payment_method_id: method.id,
            payment_record_status: PaymentRecordStatus::Pending,
        })
        .await
        .unwrap();

    let detail = db.get_order_detail(order.id).await.unwrap().unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.payments.len(), 1);

    db.mark_order_paid(order.id).await.unwrap();
    db.insert_payment(&NewPayment {
        order_id: order.id,
        method_id: method.id,
        amount: Decimal::new(20000, 0),
        status: PaymentRecordStatus::Success,
        reference_code: Some("qris".to_string()),
    })
    .await
    .unwrap();

    let stored = db.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Lunas);
    let latest = db.latest_payment(order.id).await.unwrap().unwrap();
    assert_eq!(latest.status, PaymentRecordStatus::Success);

    // Referenced category and product are protected.
    let err = db.delete_category(category.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn order_with_unknown_product_leaves_nothing_behind() {
    let db = database().await;
    let method = db
        .create_payment_method(&NewPaymentMethod {
            name: format!("Cash {}", Uuid::new_v4().simple()),
            is_active: true,
        })
        .await
        .unwrap();
    let contact = format!("09{}", &Uuid::new_v4().simple().to_string()[..8]);

    let result = db
        .create_order(&NewOrder {
            customer_name: "Sri".to_string(),
            customer_contact: contact.clone(),
            total: Decimal::new(5000, 0),
            customer_note: None,
            order_type: OrderType::Offline,
            payment_status: PaymentStatus::Lunas,
            items: vec![NewOrderItem {
                product_id: i64::MAX,
                quantity: 1,
                subtotal: Decimal::new(5000, 0),
            }],
            payment_method_id: method.id,
            payment_record_status: PaymentRecordStatus::Success,
        })
        .await;

    assert!(result.is_err());
    assert!(db.list_orders_by_contact(&contact).await.unwrap().is_empty());
}
