//! Provider contract and runtime source selection.
//!
//! The MarketDataProvider trait abstracts over data sources (Yahoo chart API,
//! KRX market data) so we can swap implementations and mock for tests.

use super::cache::CachedProvider;
use super::circuit_breaker::CircuitBreaker;
use super::http::{HttpTransport, ReqwestTransport};
use super::krx::KrxProvider;
use super::symbols::SymbolMap;
use super::yahoo::YahooProvider;
use crate::config::DashboardConfig;
use crate::domain::{OhlcvTable, SecondarySeries};
use crate::error::{ConfigError, DataError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Which adapter serves index data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Yahoo Finance chart API. Global index coverage.
    #[default]
    #[serde(alias = "fdr")]
    Yahoo,
    /// Korea Exchange market data. Domestic indices only.
    #[serde(alias = "pykrx")]
    Krx,
}

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Yahoo => "yahoo",
            SourceKind::Krx => "krx",
        }
    }

    /// The adapter to suggest when this one cannot serve a symbol.
    pub fn alternate(self) -> SourceKind {
        match self {
            SourceKind::Yahoo => SourceKind::Krx,
            SourceKind::Krx => SourceKind::Yahoo,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" | "fdr" => Ok(SourceKind::Yahoo),
            "krx" | "pykrx" => Ok(SourceKind::Krx),
            _ => Err(ConfigError::UnknownSource(s.to_string())),
        }
    }
}

/// Capability set every market-data adapter provides.
///
/// Dates are inclusive bounds. Output tables always use the canonical OHLCV
/// columns whatever the provider's native naming.
pub trait MarketDataProvider: Send + Sync {
    /// Stable name, used in cache keys and log fields.
    fn name(&self) -> &str;

    /// Readable index names this adapter maps to tickers.
    fn symbols(&self) -> &SymbolMap;

    /// Daily OHLCV for an index, by readable name or provider ticker.
    fn get_index_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvTable, DataError>;

    /// Daily VIX closes.
    fn get_vix_history(&self, start: NaiveDate, end: NaiveDate)
        -> Result<SecondarySeries, DataError>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn symbols(&self) -> &SymbolMap {
        (**self).symbols()
    }

    fn get_index_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvTable, DataError> {
        (**self).get_index_ohlcv(symbol, start, end)
    }

    fn get_vix_history(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SecondarySeries, DataError> {
        (**self).get_vix_history(start, end)
    }
}

/// Build the adapter for `kind` on top of an existing transport.
pub fn build_provider(
    kind: SourceKind,
    config: &DashboardConfig,
    transport: Arc<dyn HttpTransport>,
) -> Box<dyn MarketDataProvider> {
    let yahoo = YahooProvider::with_symbols(Arc::clone(&transport), config.yahoo_symbols());
    let provider: Box<dyn MarketDataProvider> = match kind {
        SourceKind::Yahoo => Box::new(yahoo),
        SourceKind::Krx => Box::new(KrxProvider::with_symbols(
            transport,
            config.krx_symbols(),
            yahoo,
        )),
    };

    if config.cache.enabled {
        Box::new(CachedProvider::new(
            provider,
            Duration::from_secs(config.cache.ttl_secs),
        ))
    } else {
        provider
    }
}

/// The production transport described by `config.http`.
pub fn default_transport(config: &DashboardConfig) -> Result<Arc<dyn HttpTransport>, DataError> {
    let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(
        config.http.breaker_cooldown_secs,
    )));
    let transport = ReqwestTransport::new(&config.http, breaker)?;
    Ok(Arc::new(transport))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_names_and_aliases() {
        assert_eq!("yahoo".parse::<SourceKind>().unwrap(), SourceKind::Yahoo);
        assert_eq!("FDR".parse::<SourceKind>().unwrap(), SourceKind::Yahoo);
        assert_eq!("krx".parse::<SourceKind>().unwrap(), SourceKind::Krx);
        assert_eq!("pykrx".parse::<SourceKind>().unwrap(), SourceKind::Krx);
    }

    #[test]
    fn unknown_source_is_config_error() {
        let err = "bloomberg".parse::<SourceKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSource(ref s) if s == "bloomberg"));
    }

    #[test]
    fn alternates_point_at_each_other() {
        assert_eq!(SourceKind::Krx.alternate(), SourceKind::Yahoo);
        assert_eq!(SourceKind::Yahoo.alternate(), SourceKind::Krx);
    }
}
