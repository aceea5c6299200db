use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use pulseops_core::config::{AppConfig, StoreBackend};
use pulseops_core::normalize::{
    client_decimal, client_text, ClientField, RawRecord, CLIENT_FIELD_MAP,
};
use pulseops_core::scoring::{recalculate, RecalcTrigger};
use pulseops_core::store::{ClientStore, StoreError};

pub mod api;
pub mod memory;
pub mod sql;

pub use api::ApiClientStore;
pub use memory::InMemoryClientStore;
pub use sql::SqlClientStore;

#[derive(Debug, Error)]
pub enum StoreOpenError {
    #[error("failed to connect to database `{url}`: {source}")]
    Connect {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to run database migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to build api client: {0}")]
    Api(#[from] reqwest::Error),
}

/// Builds the store selected by `store.backend`.
///
/// The database backend runs pending migrations before returning; the memory
/// backend starts from the demo portfolio.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ClientStore>, StoreOpenError> {
    info!(
        event_name = "store.open",
        backend = config.store.backend.as_str(),
        "opening client store"
    );

    let store: Arc<dyn ClientStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryClientStore::seeded()),
        StoreBackend::Database => {
            let pool = crate::connect_from_config(&config.database).await.map_err(|source| {
                StoreOpenError::Connect { url: config.database.url.clone(), source }
            })?;
            crate::migrations::run_pending(&pool).await?;
            Arc::new(SqlClientStore::new(pool))
        }
        StoreBackend::Api => Arc::new(ApiClientStore::from_config(config)?),
    };
    Ok(store)
}

pub(crate) fn map_sqlx(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Database(database) if database.is_unique_violation() => {
            StoreError::Rejected(format!("duplicate client code: {}", database.message()))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Decode(error.to_string())
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}

/// Applies a partial edit to a stored record and rewrites its derived fields.
///
/// Every alias of an edited field is dropped first, so a zero in the patch
/// cannot fall through to a stale value stored under another name.
pub(crate) fn merge_update(existing: &mut RawRecord, patch: RawRecord) {
    let manual_health = client_decimal(&patch, ClientField::HealthScore);
    for (_, aliases) in CLIENT_FIELD_MAP {
        if aliases.iter().any(|alias| patch.contains_key(*alias)) {
            for alias in *aliases {
                existing.remove(*alias);
            }
        }
    }
    existing.extend(patch);
    recalculate(existing, RecalcTrigger::Update { manual_health });
}

pub(crate) fn same_client(raw: &RawRecord, id: &str) -> bool {
    client_text(raw, ClientField::Id).as_deref() == Some(id)
}
