//! Request pipeline middleware that runs inside the error handler.
//!
//! ```text
//! error_handler → body_parser → cookies → sanitize (nosql, xss) → param_pollution → routes
//! ```

pub mod body_parser;
pub mod cookies;
pub mod error_handler;
pub mod param_pollution;
pub mod sanitize;

pub use body_parser::{body_parser_middleware, BodyLimit, JsonBody, ParsedBody};
pub use cookies::{cookie_parser_middleware, Cookies};
pub use error_handler::{error_handler_middleware, render_error};
pub use param_pollution::param_pollution_middleware;
pub use sanitize::{nosql_sanitize_middleware, xss_sanitize_middleware};
