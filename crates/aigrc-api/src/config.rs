//! Environment-driven configuration for the ingestion gateway (§2.1 C15).
//!
//! Mirrors the 12-factor style used throughout the pipeline: a `from_env`
//! constructor that fails loudly on a missing/undersized secret, plus a
//! `default()`/test constructor that never touches the environment so tests
//! stay hermetic.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AIGRC_JWT_SECRET is required and must be at least 32 bytes")]
    MissingOrShortJwtSecret,
    #[error("{0} could not be parsed: {1}")]
    InvalidValue(&'static str, String),
}

/// Minimum length, in bytes, of the HS256 signing secret.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    pub cors_origins: Vec<String>,
    pub requests_per_minute: u32,
}

impl ApiConfig {
    /// Reads configuration from the environment. `AIGRC_JWT_SECRET` is
    /// mandatory; every other variable has a documented default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret =
            std::env::var("AIGRC_JWT_SECRET").map_err(|_| ConfigError::MissingOrShortJwtSecret)?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::MissingOrShortJwtSecret);
        }

        let request_timeout = std::env::var("AIGRC_REQUEST_TIMEOUT_SECS")
            .ok()
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue("AIGRC_REQUEST_TIMEOUT_SECS", e.to_string()))
            })
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let max_body_bytes = std::env::var("AIGRC_MAX_BODY_BYTES")
            .ok()
            .map(|v| {
                v.parse::<usize>()
                    .map_err(|e| ConfigError::InvalidValue("AIGRC_MAX_BODY_BYTES", e.to_string()))
            })
            .transpose()?
            .unwrap_or(2 * 1024 * 1024);

        let cors_origins = std::env::var("AIGRC_CORS_ORIGINS")
            .ok()
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let requests_per_minute = std::env::var("AIGRC_RATE_LIMIT_PER_MINUTE")
            .ok()
            .map(|v| {
                v.parse::<u32>()
                    .map_err(|e| ConfigError::InvalidValue("AIGRC_RATE_LIMIT_PER_MINUTE", e.to_string()))
            })
            .transpose()?
            .unwrap_or(600);

        Ok(Self {
            jwt_secret,
            request_timeout,
            max_body_bytes,
            cors_origins,
            requests_per_minute,
        })
    }

    /// Deterministic configuration for tests: never reads the environment.
    pub fn for_tests() -> Self {
        Self {
            jwt_secret: "test-secret-at-least-32-bytes-long!!".to_string(),
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 2 * 1024 * 1024,
            cors_origins: Vec::new(),
            requests_per_minute: 600,
        }
    }
}
