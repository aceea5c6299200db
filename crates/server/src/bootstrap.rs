use std::sync::Arc;

use axum::Router;
use pulseops_core::config::{AppConfig, ConfigError, LoadOptions};
use pulseops_core::dashboard::DashboardService;
use pulseops_core::store::ClientStore;
use pulseops_db::{open_store, StoreOpenError};
use thiserror::Error;
use tracing::info;

use crate::{health, routes};

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<dyn ClientStore>,
    pub dashboard: Arc<DashboardService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("client store could not be opened: {0}")]
    Store(#[from] StoreOpenError),
}

impl Application {
    /// The API routes plus `/health`, sharing one store handle.
    pub fn router(&self) -> Router {
        routes::router(self.dashboard.clone())
            .merge(health::router(self.store.clone(), self.config.store.backend.as_str()))
    }
}

/// Router over an already opened store.
pub fn app_router(store: Arc<dyn ClientStore>, backend: &'static str) -> Router {
    let dashboard = Arc::new(DashboardService::new(store.clone()));
    routes::router(dashboard).merge(health::router(store, backend))
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        store_backend = config.store.backend.as_str(),
        "starting application bootstrap"
    );

    let store = open_store(&config).await?;
    let dashboard = Arc::new(DashboardService::new(store.clone()));

    info!(
        event_name = "system.bootstrap.store_ready",
        correlation_id = "bootstrap",
        store_backend = config.store.backend.as_str(),
        "client store ready"
    );

    Ok(Application { config, store, dashboard })
}

#[cfg(test)]
mod tests {
    use pulseops_core::config::{ConfigOverrides, LoadOptions, StoreBackend};

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_rejects_invalid_database_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                store_backend: Some(StoreBackend::Database),
                database_url: Some("postgres://localhost/pulseops".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("database.url"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn database_backend_bootstraps_with_migrated_schema() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                store_backend: Some(StoreBackend::Database),
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed against an in-memory database");

        let clients = app.dashboard.clients().await.expect("empty portfolio should load");
        assert!(clients.is_empty());

        let stats = app.dashboard.stats().await.expect("stats");
        assert_eq!(stats.total_clients, 0);
    }

    #[tokio::test]
    async fn memory_backend_serves_demo_portfolio() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                store_backend: Some(StoreBackend::Memory),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("memory bootstrap");

        let overview = app.dashboard.msp_overview().await.expect("overview");
        assert_eq!(overview.total_clients, 8);
        assert_eq!(overview.inactive_clients, 1);
    }
}
