//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (CORS headers, preflight answered for any path)
//!     → headers.rs (helmet-style response headers, CSP)
//!     → rate_limit.rs (per-client window on the API prefix)
//!     → error handler and the rest of the pipeline
//! ```

pub mod cors;
pub mod headers;
pub mod rate_limit;

pub use cors::{cors_layer, options_preflight_middleware};
pub use headers::{security_headers_middleware, SecurityHeaders};
pub use rate_limit::{rate_limit_middleware, start_cleanup_task, RateLimiter};
