pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod stores;

pub use connection::{connect, connect_from_config, connect_with_settings, DbPool};
pub use fixtures::SeedSummary;
pub use stores::{open_store, ApiClientStore, InMemoryClientStore, SqlClientStore, StoreOpenError};
