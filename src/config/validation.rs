//! Configuration validation.
//!
//! Semantic checks only (serde handles syntax). Every failing check is
//! reported, not just the first one.

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.enabled {
        if rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
        }
        if rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
        }
        if !rate_limit.path_prefix.starts_with('/') {
            errors.push(ValidationError::new("rate_limit.path_prefix", "must start with '/'"));
        }
        if rate_limit.cleanup_interval_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.cleanup_interval_secs",
                "must be greater than 0",
            ));
        }
    }

    if config.body.limit_bytes == 0 {
        errors.push(ValidationError::new("body.limit_bytes", "must be greater than 0"));
    }

    if config.cors.allowed_origins.is_empty() {
        errors.push(ValidationError::new("cors.allowed_origins", "must not be empty"));
    }

    for method in &config.cors.allowed_methods {
        if method.parse::<axum::http::Method>().is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_methods",
                format!("'{}' is not an HTTP method", method),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
