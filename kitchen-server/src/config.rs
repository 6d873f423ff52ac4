//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup. Required values are collected
//! and reported together so a misconfigured deployment fails with one message.

use std::collections::BTreeMap;
use std::env;
use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::web::body::DEFAULT_MAX_BODY_BYTES;

/// Name of the generic webhook source.
pub const CUSTOM_SOURCE: &str = "custom";

/// Configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Deployment label, e.g. `development` or `production`
    pub env: String,

    /// Postgres connection URL
    pub database_url: String,

    /// Upper bound for the Postgres pool
    pub database_max_connections: u32,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,

    pub log_format: LogFormat,

    /// Ceiling for captured request bodies
    pub max_body_bytes: usize,

    /// Shared signing secret per webhook source name
    pub webhook_secrets: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let mut missing = Vec::new();
        let mut required = |name: &str| {
            get(name).unwrap_or_else(|| {
                missing.push(name.to_string());
                String::new()
            })
        };

        let database_url = required("DATABASE_URL");
        let custom_secret = required("WEBHOOK_SECRET_CUSTOM");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Config {
            port: parse_or("PORT", get("PORT"), 8080),

            env: get("ENV").unwrap_or_else(|| "development".to_string()),

            database_url,

            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                10,
            ),

            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            log_format: parse_log_format(get("LOG_FORMAT")),

            max_body_bytes: parse_or("MAX_BODY_BYTES", get("MAX_BODY_BYTES"), DEFAULT_MAX_BODY_BYTES),

            webhook_secrets: BTreeMap::from([(CUSTOM_SOURCE.to_string(), custom_secret)]),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("env", &self.env)
            .field("database_url_set", &!self.database_url.is_empty())
            .field("database_max_connections", &self.database_max_connections)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("webhook_sources", &self.webhook_secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parse an optional value, warning and falling back on garbage.
fn parse_or<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }),
    }
}

fn parse_log_format(raw: Option<String>) -> LogFormat {
    match raw.as_deref().map(str::trim) {
        None => LogFormat::Pretty,
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
        Some(v) => {
            warn!(env_var = "LOG_FORMAT", value = %v, "Invalid log format, using pretty");
            LogFormat::Pretty
        }
    }
}
