//! # EventHub
//!
//! Event publication and participant reservations over a REST API.
//!
//! - **domain**: entities, status machines and store traits
//! - **application**: admission, lifecycles, accounts and tickets
//! - **infrastructure**: SeaORM persistence, in-memory stores, JWT and bcrypt
//! - **interfaces**: axum router, handlers and OpenAPI
//! - **shared**: error taxonomy, pagination, retry and shutdown helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use interfaces::http::create_api_router;
