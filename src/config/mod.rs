//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, NODE_ENV / PORT overrides)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc with the middleware that needs it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the server runs without a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BodyConfig, CompressionConfig, CorsConfig, CspDirective, DataConfig, Environment,
    ListenerConfig, ObservabilityConfig, ParamPollutionConfig, RateLimitConfig, SecurityConfig,
    ServerConfig, StaticFilesConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
