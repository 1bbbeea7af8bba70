//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the tour server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Runtime environment (development enables request logging).
    pub environment: Environment,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting applied to the API prefix.
    pub rate_limit: RateLimitConfig,

    /// Request body parsing limits.
    pub body: BodyConfig,

    /// Security response headers.
    pub security: SecurityConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Response compression.
    pub compression: CompressionConfig,

    /// Static asset serving.
    pub static_files: StaticFilesConfig,

    /// HTTP parameter pollution prevention.
    pub param_pollution: ParamPollutionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Seed data.
    pub data: DataConfig,
}

/// Runtime environment, selected by `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse an environment name; anything other than `production` is development.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Trust `X-Forwarded-For` for the client address (running behind a proxy).
    pub trust_proxy: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            trust_proxy: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 10,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Path prefix the limiter applies to.
    pub path_prefix: String,

    /// Maximum requests per client within one window.
    pub max_requests: u64,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Body sent with the 429 response.
    pub message: String,

    /// How often expired windows are pruned, in seconds.
    pub cleanup_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_prefix: "/api".to_string(),
            max_requests: 100,
            window_secs: 60 * 60,
            message: "Too many requests from this IP, please try again in an hour!".to_string(),
            cleanup_interval_secs: 300,
        }
    }
}

/// Request body parsing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum JSON / urlencoded body size in bytes.
    pub limit_bytes: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            limit_bytes: 10 * 1024,
        }
    }
}

/// Security header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,

    /// Send Strict-Transport-Security.
    pub hsts: bool,

    /// Content-Security-Policy directives, in order.
    pub content_security_policy: Vec<CspDirective>,
}

/// A single CSP directive: `name` followed by its source list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CspDirective {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl CspDirective {
    pub fn new(name: &str, sources: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            hsts: true,
            content_security_policy: vec![
                CspDirective::new(
                    "default-src",
                    &[
                        "'self'",
                        "https://*.mapbox.com",
                        "https://js.stripe.com/",
                        "http://www.w3.org/2000/",
                        "unsafe-eval",
                    ],
                ),
                CspDirective::new("base-uri", &["'self'"]),
                CspDirective::new("font-src", &["'self'", "https:", "data:"]),
                CspDirective::new(
                    "script-src",
                    &[
                        "'self'",
                        "https://*.mapbox.com",
                        "https://cdn.jsdelivr.net",
                        "http://127.0.0.1:3000",
                        "https://js.stripe.com/",
                        "unsafe-inline",
                        "blob:",
                    ],
                ),
                CspDirective::new("object-src", &["'none'"]),
                CspDirective::new("style-src", &["'self'", "https:", "unsafe-inline"]),
                CspDirective::new("upgrade-insecure-requests", &[]),
            ],
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods for cross-origin requests.
    pub allowed_methods: Vec<String>,

    /// Preflight cache lifetime in seconds (omitted when zero).
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            max_age_secs: 0,
        }
    }
}

/// Compression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub enabled: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory served at the site root.
    pub public_dir: PathBuf,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
        }
    }
}

/// Parameter pollution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParamPollutionConfig {
    /// Query parameters allowed to repeat.
    pub whitelist: Vec<String>,
}

impl Default for ParamPollutionConfig {
    fn default() -> Self {
        Self {
            whitelist: [
                "duration",
                "ratingsQuantity",
                "ratingsAverage",
                "maxGroupSize",
                "difficulty",
                "price",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "tour_server=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Seed data configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DataConfig {
    /// JSON array of tours imported at startup.
    pub tours_seed: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = ServerConfig::default();
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_secs, 3600);
        assert_eq!(config.body.limit_bytes, 10 * 1024);
        assert_eq!(config.security.content_security_policy.len(), 7);
        assert!(config.param_pollution.whitelist.contains(&"price".to_string()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            environment = "production"

            [rate_limit]
            max_requests = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.path_prefix, "/api");
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_environment_from_name() {
        assert_eq!(Environment::from_name("production"), Environment::Production);
        assert_eq!(Environment::from_name(" PRODUCTION "), Environment::Production);
        assert_eq!(Environment::from_name("development"), Environment::Development);
        assert_eq!(Environment::from_name("test"), Environment::Development);
    }
}
