pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod repositories;

pub use config::{Config, ConfigError, ParameterStoreConfig};
pub use handlers::{create_app, RequestRouter};
pub use observability::{init_observability, shutdown_observability, Metrics};
