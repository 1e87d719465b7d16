//! Structured error types.
//!
//! Fetch failures and configuration mistakes are separate enums so callers can
//! branch on the kind instead of matching message strings. An empty table is
//! never an error.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// The configured data source could not return data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("provider error: {0}")]
    Provider(String),
}

/// An unsupported or malformed request, raised before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{provider} does not support index '{symbol}'; use the '{alternate}' source instead")]
    UnsupportedSymbol {
        symbol: String,
        provider: String,
        alternate: String,
    },

    #[error("unknown data source '{0}' (expected 'yahoo' or 'krx')")]
    UnknownSource(String),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for provider and ranking operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DataError {
    pub fn is_fetch(&self) -> bool {
        matches!(self, DataError::Fetch(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, DataError::Config(_))
    }
}

/// Reject `start > end` before touching the network.
pub fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ConfigError> {
    if start > end {
        return Err(ConfigError::InvalidDateRange { start, end });
    }
    Ok(())
}
