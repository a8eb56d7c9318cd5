//! Configuration management for Teamjoin Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `json` selects the structured formatter, anything else plain text
    pub log_format: String,
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            metrics_enabled: false,
            service_name: "teamjoin-core".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            http_host: var("HTTP_HOST", "0.0.0.0"),
            http_port: var("HTTP_PORT", "8080")
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: var("DATABASE_MAX_CONNECTIONS", "10").parse().unwrap_or(10),
                min_connections: var("DATABASE_MIN_CONNECTIONS", "2").parse().unwrap_or(2),
            },
            jwt: JwtConfig {
                secret: lookup("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: var("JWT_ISSUER", "teamjoin-core"),
                access_token_ttl_secs: var("JWT_ACCESS_TOKEN_TTL_SECS", "3600")
                    .parse()
                    .unwrap_or(3600),
            },
            telemetry: TelemetryConfig {
                log_format: var("LOG_FORMAT", "text"),
                metrics_enabled: var("METRICS_ENABLED", "false")
                    .parse()
                    .unwrap_or(false),
                service_name: var("SERVICE_NAME", "teamjoin-core"),
            },
        })
    }

    /// Socket address string for the HTTP listener
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
