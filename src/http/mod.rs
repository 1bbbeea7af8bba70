//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (router, middleware pipeline, graceful shutdown)
//!     → request.rs (request id, client address)
//!     → middleware/ (error handler, body parsing, cookies, sanitization)
//!     → routes (handlers)
//!     → response.rs (JSON envelopes, HTML pages)
//! ```

pub mod middleware;
pub mod query;
pub mod request;
pub mod response;
pub mod server;

pub use query::QueryString;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::AppServer;
