//! Readable index name → provider ticker tables.
//!
//! Each adapter owns its own table. Configuration may override or extend it.

use std::collections::BTreeMap;

const YAHOO_DEFAULTS: &[(&str, &str)] = &[
    ("KOSPI", "^KS11"),
    ("KOSDAQ", "^KQ11"),
    ("S&P 500", "^GSPC"),
    ("NASDAQ", "^IXIC"),
    ("Dow Jones", "^DJI"),
    ("Nikkei 225", "^N225"),
];

const KRX_DEFAULTS: &[(&str, &str)] = &[("KOSPI", "1001"), ("KOSDAQ", "2001")];

/// Ordered lookup table. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolMap {
    entries: Vec<(String, String)>,
}

impl SymbolMap {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut map = Self::default();
        for (name, ticker) in pairs {
            map.insert(name, ticker);
        }
        map
    }

    pub fn yahoo_default() -> Self {
        Self::from_pairs(YAHOO_DEFAULTS.iter().copied())
    }

    pub fn krx_default() -> Self {
        Self::from_pairs(KRX_DEFAULTS.iter().copied())
    }

    /// Add or replace a mapping.
    pub fn insert(&mut self, name: &str, ticker: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = ticker.to_string(),
            None => self.entries.push((name.to_string(), ticker.to_string())),
        }
    }

    pub fn merge(&mut self, overrides: &BTreeMap<String, String>) {
        for (name, ticker) in overrides {
            self.insert(name, ticker);
        }
    }

    /// Ticker for a readable name, if mapped.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }

    /// Mapped ticker, or the input itself when the name is unknown.
    pub fn resolve<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.lookup(symbol).unwrap_or(symbol)
    }

    /// Accepts a readable name or one of the mapped tickers; nothing else.
    pub fn resolve_strict(&self, symbol: &str) -> Option<&str> {
        self.lookup(symbol).or_else(|| {
            self.entries
                .iter()
                .find(|(_, t)| t == symbol)
                .map(|(_, t)| t.as_str())
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
