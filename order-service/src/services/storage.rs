use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Product photos.
pub const MENU_BUCKET: &str = "uploads";
/// QRIS images attached to payment methods.
pub const QRIS_BUCKET: &str = "qris-images";
/// Customer transfer receipts.
pub const PROOF_BUCKET: &str = "bukti-pembayaran";

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `bucket/key`, replacing any existing object, and
    /// return its public URL.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;

    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Replace anything outside `[A-Za-z0-9._-]` so client filenames are safe as object keys.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// `<unix-millis>_<filename>`
pub fn upload_key(filename: &str) -> String {
    format!("{}_{}", Utc::now().timestamp_millis(), sanitize_filename(filename))
}

pub fn product_image_key(product_id: i64) -> String {
    format!("produk_{}_{}", product_id, Utc::now().timestamp_millis())
}

pub fn qris_image_key(method_id: i64) -> String {
    format!("qris_{}_{}", method_id, Utc::now().timestamp_millis())
}

/// Filesystem storage, one directory per bucket. Files are served under
/// `public_base_url` by the router.
pub struct LocalStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let dir = self.base_path.join(bucket);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(key), data).await?;
        Ok(self.public_url(bucket, key))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, key)
    }
}

/// Supabase Storage over its REST API.
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: Secret<String>,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: Secret<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.service_key.expose_secret())
            .header("apikey", self.service_key.expose_secret())
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::BadGateway(format!("Storage upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BadGateway(format!(
                "Storage upload rejected ({}): {}",
                status, body
            )));
        }

        info!(bucket = bucket, key = key, "Object uploaded");

        Ok(self.public_url(bucket, key))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, key
        )
    }
}
