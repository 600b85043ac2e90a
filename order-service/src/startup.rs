//! Application startup and lifecycle management.

use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{OrderConfig, StorageBackend};
use crate::services::{
    init_metrics, Dashboard, Database, JwtService, LocalStorage, ObjectStorage, OrderLifecycle,
    PakasirClient, Store, SupabaseStorage,
};
use crate::{build_router, AppState};

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: axum::Router,
}

impl Application {
    /// Connect to the database, pick the storage backend and bind the listener.
    pub async fn build(config: OrderConfig) -> Result<Self, AppError> {
        let database = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        if config.database.run_migrations {
            database.run_migrations().await?;
        }

        let (storage, local_files): (Arc<dyn ObjectStorage>, Option<PathBuf>) =
            match config.storage.backend {
                StorageBackend::Supabase => {
                    let (Some(url), Some(key)) = (
                        config.storage.supabase_url.as_deref(),
                        config.storage.service_key.clone(),
                    ) else {
                        return Err(AppError::ConfigError(anyhow::anyhow!(
                            "Supabase storage selected without url or service key"
                        )));
                    };
                    tracing::info!("Using Supabase storage");
                    (Arc::new(SupabaseStorage::new(url, key)), None)
                }
                StorageBackend::Local => {
                    let local = LocalStorage::new(
                        &config.storage.local_path,
                        &config.storage.public_base_url,
                    )
                    .await?;
                    tracing::info!(path = %config.storage.local_path, "Using local file storage");
                    let dir = local.base_path().clone();
                    (Arc::new(local), Some(dir))
                }
            };

        let pakasir = PakasirClient::new(config.pakasir.clone());
        if pakasir.is_configured() {
            tracing::info!("Pakasir client initialized");
        } else {
            tracing::warn!("Pakasir credentials not configured - status polling will fail");
        }

        init_metrics()?;

        let store: Arc<dyn Store> = Arc::new(database);
        let state = AppState {
            lifecycle: OrderLifecycle::new(store.clone(), storage.clone(), Arc::new(pakasir)),
            dashboard: Dashboard::new(store.clone(), config.outlet.offset()?),
            jwt: JwtService::new(&config.jwt)?,
            store,
            storage,
        };

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();
        tracing::info!("Order service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state, local_files),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl-C.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
