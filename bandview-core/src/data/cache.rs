//! Optional in-memory fetch cache in front of a provider.
//!
//! Key: `(provider, symbol, start, end)`. Entries older than the freshness
//! window are never served and are pruned whenever a new entry is stored.
//! Only successful fetches are stored; errors always reach the caller.

use super::provider::MarketDataProvider;
use super::symbols::SymbolMap;
use super::yahoo::VIX_TICKER;
use crate::domain::{OhlcvTable, SecondarySeries};
use crate::error::DataError;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: String,
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
}

#[derive(Debug)]
struct Store<T> {
    entries: Mutex<HashMap<CacheKey, Entry<T>>>,
}

impl<T: Clone> Store<T> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &CacheKey, ttl: Duration) -> Option<T> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert `value` and drop every entry older than `ttl`.
    fn put(&self, key: CacheKey, value: T, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned stale cache entries");
        }
        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Provider wrapper that memoizes fetches for `ttl`.
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    ohlcv: Store<OhlcvTable>,
    vix: Store<SecondarySeries>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            ohlcv: Store::new(),
            vix: Store::new(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of stored entries. Stale ones count until the next store.
    pub fn len(&self) -> usize {
        self.ohlcv.len() + self.vix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> CacheKey {
        CacheKey {
            provider: self.inner.name().to_string(),
            symbol: symbol.to_string(),
            start,
            end,
        }
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn symbols(&self) -> &SymbolMap {
        self.inner.symbols()
    }

    fn get_index_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvTable, DataError> {
        let key = self.key(symbol, start, end);
        if let Some(table) = self.ohlcv.get(&key, self.ttl) {
            tracing::debug!(symbol, %start, %end, "ohlcv cache hit");
            return Ok(table);
        }
        let table = self.inner.get_index_ohlcv(symbol, start, end)?;
        self.ohlcv.put(key, table.clone(), self.ttl);
        Ok(table)
    }

    fn get_vix_history(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SecondarySeries, DataError> {
        let key = self.key(VIX_TICKER, start, end);
        if let Some(series) = self.vix.get(&key, self.ttl) {
            tracing::debug!(%start, %end, "vix cache hit");
            return Ok(series);
        }
        let series = self.inner.get_vix_history(start, end)?;
        self.vix.put(key, series.clone(), self.ttl);
        Ok(series)
    }
}
