//! Bandview Core: index data providers, volatility bands, VIX alignment, ETF ranking.
//!
//! This crate contains everything below the presentation layer:
//! - Provider adapters (Yahoo chart API, KRX) behind one trait, selected at runtime
//! - Canonical OHLCV tables with a fixed schema whatever the source
//! - Rolling mean / std and the six volatility bands
//! - Alignment of a secondary series onto the index calendar
//! - Volume ranking of domestic ETFs with keyword exclusion

pub mod config;
pub mod dashboard;
pub mod data;
pub mod domain;
pub mod error;
pub mod etf;
pub mod indicators;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, IndexView, SecondaryStatus};
pub use error::{ConfigError, DataError, FetchError};
