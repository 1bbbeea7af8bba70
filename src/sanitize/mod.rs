//! Input sanitization.
//!
//! Pure transformations over parsed request input. The middleware that
//! applies them lives in `http::middleware`.
//!
//! ```text
//! parsed body / query
//!     → nosql.rs     (drop `$`-operators and dotted keys)
//!     → xss.rs       (escape markup in string values)
//!     → pollution.rs (collapse repeated query parameters)
//! ```

pub mod nosql;
pub mod pollution;
pub mod xss;

pub use pollution::PollutionFilter;
