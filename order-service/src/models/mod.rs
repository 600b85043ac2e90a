pub mod catalog;
pub mod order;
pub mod payment;
pub mod user;

pub use catalog::{
    Category, NewPaymentMethod, NewProduct, PaymentMethod, PaymentMethodUpdate, Product,
    ProductUpdate, ProductWithCategory,
};
pub use order::{
    FulfillmentStatus, NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderItemDetail,
    OrderStatusUpdate, OrderType, PaymentStatus,
};
pub use payment::{NewPayment, Payment, PaymentDetail, PaymentRecordStatus};
pub use user::User;

/// Name of the payment method that triggers settle-on-creation for walk-in orders.
pub const CASH_METHOD_NAME: &str = "cash";

/// Name of the payment method used for orders paid through the online gateway.
pub const PAKASIR_METHOD_NAME: &str = "Pakasir";

fn decode_error(column: &str, err: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: anyhow::anyhow!(err).into(),
    }
}
