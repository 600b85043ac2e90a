pub mod dashboard;
pub mod database;
pub mod jwt;
pub mod metrics;
pub mod mock_store;
pub mod orders;
pub mod pakasir;
pub mod storage;
pub mod store;

pub use dashboard::Dashboard;
pub use database::Database;
pub use jwt::{Claims, JwtService};
pub use metrics::{get_metrics, init_metrics};
pub use mock_store::MockStore;
pub use orders::OrderLifecycle;
pub use pakasir::{GatewayStatus, MockGateway, PakasirClient, PaymentGateway};
pub use storage::{LocalStorage, ObjectStorage, SupabaseStorage};
pub use store::Store;
