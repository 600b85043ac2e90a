use chrono::FixedOffset;
use order_service::config::JwtConfig;
use order_service::models::{NewPaymentMethod, NewProduct, Order};
use order_service::services::{
    Dashboard, JwtService, LocalStorage, MockGateway, MockStore, OrderLifecycle, Store,
};
use order_service::utils::{hash_password, Password};
use order_service::{build_router, AppState};
use rust_decimal::Decimal;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@warung.id";
pub const ADMIN_PASSWORD: &str = "rahasia123";

/// Ids of the reference data every test starts from.
pub struct Catalog {
    pub category_id: i64,
    pub product_id: i64,
    pub cash_method_id: i64,
    pub transfer_method_id: i64,
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<MockStore>,
    pub gateway: Arc<MockGateway>,
    pub jwt: JwtService,
    pub files: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let files = tempfile::tempdir().expect("Failed to create storage dir");
        let store = Arc::new(MockStore::new());
        let gateway = Arc::new(MockGateway::new());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let storage = Arc::new(
            LocalStorage::new(files.path(), format!("{}/files", address))
                .await
                .expect("Failed to create local storage"),
        );
        let jwt = JwtService::new(&JwtConfig {
            secret: Secret::new("test-secret".to_string()),
            expiry_hours: 24,
        })
        .expect("Failed to create JWT service");

        let dyn_store: Arc<dyn Store> = store.clone();
        let state = AppState {
            lifecycle: OrderLifecycle::new(dyn_store.clone(), storage.clone(), gateway.clone()),
            dashboard: Dashboard::new(dyn_store.clone(), FixedOffset::east_opt(7 * 3600).unwrap()),
            jwt: jwt.clone(),
            store: dyn_store,
            storage,
        };

        let router = build_router(state, Some(files.path().to_path_buf()));
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        let hash = hash_password(&Password::new(ADMIN_PASSWORD.to_string()))
            .expect("Failed to hash admin password");
        store.seed_user(ADMIN_EMAIL, hash.as_str());

        TestApp {
            address,
            client: reqwest::Client::new(),
            store,
            gateway,
            jwt,
            files,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn admin_token(&self) -> String {
        self.jwt.generate_token(1, ADMIN_EMAIL).unwrap()
    }

    pub async fn seed_catalog(&self) -> Catalog {
        let category = self.store.create_category("Makanan").await.unwrap();
        let product = self
            .store
            .create_product(&NewProduct {
                name: "Nasi Goreng".to_string(),
                description: Some("Pedas".to_string()),
                price: Decimal::new(10000, 0),
                category_id: category.id,
                image_url: None,
            })
            .await
            .unwrap();
        let cash = self
            .store
            .create_payment_method(&NewPaymentMethod {
                name: "Cash".to_string(),
                is_active: true,
            })
            .await
            .unwrap();
        let transfer = self
            .store
            .create_payment_method(&NewPaymentMethod {
                name: "Transfer BCA".to_string(),
                is_active: true,
            })
            .await
            .unwrap();

        Catalog {
            category_id: category.id,
            product_id: product.id,
            cash_method_id: cash.id,
            transfer_method_id: transfer.id,
        }
    }

    pub async fn post_order(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/public/orders"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Place an online order through the API and return it.
    pub async fn place_online_order(&self, catalog: &Catalog, method_id: Option<i64>) -> Order {
        let response = self
            .post_order(json!({
                "cartItems": [{ "id": catalog.product_id, "harga": 10000, "jumlah": 2 }],
                "nama_pelanggan": "Budi",
                "nomor_wa": "08123456789",
                "total_harga": 20000,
                "tipe_pesanan": "ONLINE",
                "metode_pembayaran_id": method_id
            }))
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let id = response.json::<Value>().await.unwrap()["id"]
            .as_i64()
            .unwrap();
        self.store.get_order(id).await.unwrap().unwrap()
    }

    pub async fn post_webhook(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/public/webhook/pakasir"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
