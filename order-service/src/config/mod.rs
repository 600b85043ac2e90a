use chrono::FixedOffset;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;

#[derive(Deserialize, Clone, Debug)]
pub struct OrderConfig {
    #[serde(default = "default_server")]
    pub server: core_config::Config,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pakasir: PakasirConfig,
    #[serde(default)]
    pub outlet: OutletConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: i64,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Supabase,
    Local,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    pub supabase_url: Option<String>,
    pub service_key: Option<Secret<String>>,
    #[serde(default = "default_local_path")]
    pub local_path: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            supabase_url: None,
            service_key: None,
            local_path: default_local_path(),
            public_base_url: default_public_base_url(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct PakasirConfig {
    #[serde(default)]
    pub project_slug: String,
    #[serde(default = "empty_secret")]
    pub api_key: Secret<String>,
    #[serde(default = "default_pakasir_base_url")]
    pub base_url: String,
    #[serde(default = "default_redirect_base_url")]
    pub redirect_base_url: String,
}

impl Default for PakasirConfig {
    fn default() -> Self {
        Self {
            project_slug: String::new(),
            api_key: empty_secret(),
            base_url: default_pakasir_base_url(),
            redirect_base_url: default_redirect_base_url(),
        }
    }
}

/// Local calendar of the outlet, used for dashboard day boundaries.
#[derive(Deserialize, Clone, Debug)]
pub struct OutletConfig {
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for OutletConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl OutletConfig {
    pub fn offset(&self) -> Result<FixedOffset, AppError> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "outlet.utc_offset_hours out of range: {}",
                self.utc_offset_hours
            ))
        })
    }
}

fn default_server() -> core_config::Config {
    core_config::Config {
        port: 3001,
        log_level: "info,order_service=debug".to_string(),
        otlp_endpoint: None,
    }
}

// WIB
fn default_utc_offset_hours() -> i32 {
    7
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_expiry_hours() -> i64 {
    24
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Local
}

fn default_local_path() -> String {
    "storage".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3001/files".to_string()
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_pakasir_base_url() -> String {
    "https://app.pakasir.com".to_string()
}

fn default_redirect_base_url() -> String {
    "http://localhost:3000/pesanan".to_string()
}

impl OrderConfig {
    /// Load from `.env`, `configuration.*` and `APP__*` variables, e.g.
    /// `APP__SERVER__PORT`, `APP__DATABASE__URL`, `APP__JWT__SECRET`, `APP__PAKASIR__PROJECT_SLUG`.
    pub fn load() -> Result<Self, AppError> {
        let config: OrderConfig = core_config::load()?;

        if config.storage.backend == StorageBackend::Supabase
            && (config.storage.supabase_url.is_none() || config.storage.service_key.is_none())
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "storage.supabase_url and storage.service_key are required for the supabase backend"
            )));
        }

        config.outlet.offset()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlet_offset_defaults_to_wib() {
        let offset = OutletConfig::default().offset().unwrap();
        assert_eq!(offset.local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn outlet_offset_rejects_nonsense() {
        let outlet = OutletConfig {
            utc_offset_hours: 30,
        };
        assert!(matches!(outlet.offset(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn optional_sections_have_defaults() {
        let config: OrderConfig = serde_json::from_value(serde_json::json!({
            "database": { "url": "postgres://localhost/outlet" },
            "jwt": { "secret": "s3cret" }
        }))
        .unwrap();

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.pakasir.base_url, "https://app.pakasir.com");
        assert_eq!(config.jwt.expiry_hours, 24);
        assert!(config.database.run_migrations);
    }
}
