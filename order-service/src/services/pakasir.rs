//! Pakasir payment gateway client.
//!
//! Builds hosted-checkout URLs for online orders and queries the
//! transaction-detail API when a customer polls for payment status.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::error::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::PakasirConfig;

/// Transaction state as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Completed,
    Pending,
    Failed,
    /// Any other status string, or no transaction at all.
    Unknown(String),
}

impl GatewayStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "completed" => GatewayStatus::Completed,
            "pending" => GatewayStatus::Pending,
            "failed" | "canceled" | "cancelled" | "expired" => GatewayStatus::Failed,
            other => GatewayStatus::Unknown(other.to_string()),
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Hosted checkout page for an order. Pure, no network call.
    fn checkout_url(&self, order_id: i64, amount: i64) -> String;

    /// Ask the gateway for the current state of an order's transaction.
    async fn transaction_status(
        &self,
        order_id: i64,
        amount: i64,
    ) -> Result<GatewayStatus, AppError>;
}

#[derive(Debug, Deserialize)]
struct TransactionDetailResponse {
    transaction: Option<TransactionDetail>,
}

#[derive(Debug, Deserialize)]
struct TransactionDetail {
    status: String,
}

#[derive(Clone)]
pub struct PakasirClient {
    client: Client,
    config: PakasirConfig,
}

impl PakasirClient {
    pub fn new(config: PakasirConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.project_slug.is_empty() && !self.config.api_key.expose_secret().is_empty()
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

#[async_trait]
impl PaymentGateway for PakasirClient {
    fn checkout_url(&self, order_id: i64, amount: i64) -> String {
        let redirect = format!(
            "{}/{}",
            self.config.redirect_base_url.trim_end_matches('/'),
            order_id
        );

        format!(
            "{}/pay/{}/{}?order_id={}&redirect={}",
            self.base_url(),
            self.config.project_slug,
            amount,
            order_id,
            urlencoding::encode(&redirect)
        )
    }

    async fn transaction_status(
        &self,
        order_id: i64,
        amount: i64,
    ) -> Result<GatewayStatus, AppError> {
        if !self.is_configured() {
            return Err(AppError::BadGateway(
                "Pakasir credentials not configured".to_string(),
            ));
        }

        let url = format!("{}/api/transactiondetail", self.base_url());
        let amount = amount.to_string();
        let order_id_param = order_id.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("project", self.config.project_slug.as_str()),
                ("amount", amount.as_str()),
                ("order_id", order_id_param.as_str()),
                ("api_key", self.config.api_key.expose_secret().as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::BadGateway(format!("Pakasir request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::BadGateway(format!("Pakasir response unreadable: {}", e)))?;

        tracing::debug!(order_id, status = %status, body = %body, "Pakasir transaction detail response");

        if !status.is_success() {
            return Err(AppError::BadGateway(format!(
                "Pakasir returned {}: {}",
                status, body
            )));
        }

        let detail: TransactionDetailResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::BadGateway(format!("Invalid Pakasir response: {}", e)))?;

        Ok(match detail.transaction {
            Some(transaction) => GatewayStatus::parse(&transaction.status),
            None => GatewayStatus::Unknown(String::new()),
        })
    }
}

/// Scripted gateway for tests. Counts status queries.
pub struct MockGateway {
    status: Mutex<GatewayStatus>,
    status_calls: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(GatewayStatus::Pending),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_status(&self, status: GatewayStatus) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn checkout_url(&self, order_id: i64, amount: i64) -> String {
        format!("https://pakasir.test/pay/warung/{}?order_id={}", amount, order_id)
    }

    async fn transaction_status(
        &self,
        _order_id: i64,
        _amount: i64,
    ) -> Result<GatewayStatus, AppError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .status
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mock gateway poisoned: {}", e)))?
            .clone();
        Ok(status)
    }
}
