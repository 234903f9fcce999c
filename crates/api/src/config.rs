//! Process configuration, read from environment variables.
//!
//! | variable                   | default        |
//! |----------------------------|----------------|
//! | `BIND_ADDR`                | `0.0.0.0:8080` |
//! | `DATABASE_URL`             | unset (in-memory store) |
//! | `DATABASE_MAX_CONNECTIONS` | `5`            |
//! | `PRODUCT_FIXTURES`         | unset          |
//! | `PRODUCT_FIELDS`           | every field    |
//! | `LOG_FORMAT`               | `json`         |
//!
//! Empty values count as unset.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use shopfront_observability::LogFormat;
use shopfront_products::{ProductSerializer, SerializerConfigError};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

impl ConfigError {
    fn invalid(var: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// JSON fixture seeding the in-memory store.
    pub fixtures_path: Option<PathBuf>,
    /// Exposed fields (`field` or `field=external_name`), in output order.
    pub product_fields: Option<Vec<String>>,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            fixtures_path: None,
            product_fields: None,
            log_format: LogFormat::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::invalid(
                        "DATABASE_MAX_CONNECTIONS",
                        "expected a positive integer",
                    ));
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let product_fields = get("PRODUCT_FIELDS").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            database_max_connections,
            fixtures_path: get("PRODUCT_FIXTURES").map(PathBuf::from),
            product_fields,
            log_format,
        })
    }

    /// Serializer for the list endpoint (every field unless `PRODUCT_FIELDS` is set).
    pub fn serializer(&self) -> Result<ProductSerializer, SerializerConfigError> {
        match &self.product_fields {
            Some(fields) => ProductSerializer::from_field_names(fields),
            None => Ok(ProductSerializer::full()),
        }
    }
}
