//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{Environment, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: TOML file (optional), then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServerConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `NODE_ENV` and `PORT` on top of the file configuration.
pub fn apply_env_overrides<F>(mut config: ServerConfig, lookup: F) -> ServerConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(env) = lookup("NODE_ENV") {
        config.environment = Environment::from_name(&env);
    }

    if let Some(port) = lookup("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => {
                let host = config
                    .listener
                    .bind_address
                    .rsplit_once(':')
                    .map(|(host, _)| host.to_string())
                    .unwrap_or_else(|| "127.0.0.1".to_string());
                config.listener.bind_address = format!("{}:{}", host, port);
            }
            Err(_) => tracing::warn!(port = %port, "Ignoring invalid PORT"),
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_node_env_selects_environment() {
        let config = apply_env_overrides(ServerConfig::default(), lookup(&[("NODE_ENV", "production")]));
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_port_replaces_bind_port() {
        let mut base = ServerConfig::default();
        base.listener.bind_address = "0.0.0.0:3000".to_string();

        let config = apply_env_overrides(base, lookup(&[("PORT", "8000")]));
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let config = apply_env_overrides(ServerConfig::default(), lookup(&[("PORT", "http")]));
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
