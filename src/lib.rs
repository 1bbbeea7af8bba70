//! Tour booking web application server.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod routes;
pub mod sanitize;
pub mod security;
pub mod store;

pub use config::ServerConfig;
pub use error::{AppError, StoreError};
pub use http::AppServer;
pub use lifecycle::Shutdown;
pub use store::Store;
