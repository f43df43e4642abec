//! Service configuration from environment variables.

use thiserror::Error;

pub const APP_NAME: &str = "Pulpit";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default MCP Toolbox address when TOOLBOX_URL is unset.
pub const DEFAULT_TOOLBOX_URL: &str = "http://127.0.0.1:5000";

/// Default base URL for static assets (headshots).
pub const DEFAULT_ASSETS_BASE_URL: &str = "https://storage.googleapis.com/temple-square-assets";

const DEFAULT_PORT: &str = "8080";

/// Default `RUST_LOG` filter when the environment does not set one.
pub fn default_log_filter() -> String {
    "info,pulpit=debug".to_string()
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address for the HTTP server (`0.0.0.0:PORT`).
    pub bind_addr: String,
    /// API key for the generation backend. Required.
    pub gemini_api_key: String,
    /// Base URL of the MCP Toolbox server providing retrieval tools.
    pub toolbox_url: String,
    /// Base URL for static assets; headshot URLs are built from it.
    pub assets_base_url: String,
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gemini_api_key = get("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar("GEMINI_API_KEY"))?;

        let port = get("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidVar {
                var: "PORT",
                value: port,
            });
        }

        Ok(Self {
            bind_addr: format!("0.0.0.0:{port}"),
            gemini_api_key,
            toolbox_url: get("TOOLBOX_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOOLBOX_URL.to_string()),
            assets_base_url: get("ASSETS_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ASSETS_BASE_URL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn api_key_is_required() {
        let result = Config::from_lookup(lookup(&[]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingVar("GEMINI_API_KEY"))
        ));
    }

    #[test]
    fn defaults_fill_optional_vars() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "key-123")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.toolbox_url, DEFAULT_TOOLBOX_URL);
        assert_eq!(config.assets_base_url, DEFAULT_ASSETS_BASE_URL);
        assert_eq!(config.gemini_api_key, "key-123");
    }

    #[test]
    fn explicit_vars_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "key-123"),
            ("PORT", "9090"),
            ("TOOLBOX_URL", "http://toolbox:5000"),
            ("ASSETS_BASE_URL", "https://assets.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9090");
        assert_eq!(config.toolbox_url, "http://toolbox:5000");
        assert_eq!(config.assets_base_url, "https://assets.example.com");
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "key-123"),
            ("PORT", "eight-thousand"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidVar { var: "PORT", .. })
        ));
    }

    #[test]
    fn blank_api_key_is_missing() {
        let result = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")]));
        assert!(result.is_err());
    }
}
