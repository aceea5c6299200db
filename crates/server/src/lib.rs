pub mod bootstrap;
pub mod health;
pub mod routes;

pub use bootstrap::{app_router, bootstrap, bootstrap_with_config, Application, BootstrapError};
