//! services/api/src/config.rs
//!
//! Defines the service configuration and its loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use tracing::Level;

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Origin under which public application links are built.
    pub public_base_url: String,
    pub cors_origin: HeaderValue,
    pub max_body_bytes: usize,
    /// Applications accepted per published form before the store refuses more.
    pub max_applications_per_form: Option<usize>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to keep tests hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Public Links and CORS ---
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PUBLIC_BASE_URL".to_string(),
                format!("'{}' must start with http:// or https://", public_base_url),
            ));
        }
        let public_base_url = public_base_url.trim_end_matches('/').to_string();

        let cors_origin_str =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let cors_origin = cors_origin_str.parse::<HeaderValue>().map_err(|e| {
            ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
        })?;

        // --- Limits ---
        let max_body_bytes = match std::env::var("MAX_BODY_BYTES") {
            Ok(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("MAX_BODY_BYTES".to_string(), e.to_string())
            })?,
            Err(_) => DEFAULT_MAX_BODY_BYTES,
        };

        let max_applications_per_form = std::env::var("MAX_APPLICATIONS_PER_FORM")
            .ok()
            .map(|raw| {
                raw.parse::<usize>().map_err(|e| {
                    ConfigError::InvalidValue(
                        "MAX_APPLICATIONS_PER_FORM".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            bind_address,
            log_level,
            public_base_url,
            cors_origin,
            max_body_bytes,
            max_applications_per_form,
        })
    }

    /// Public link of the application page for `token`.
    pub fn form_url(&self, token: &str) -> String {
        format!("{}/apply/{}", self.public_base_url, token)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: Level::INFO,
            public_base_url: "http://localhost:3000".to_string(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_applications_per_form: None,
        }
    }
}
