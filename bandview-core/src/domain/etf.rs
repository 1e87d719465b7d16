//! ETF listing entry.

use serde::{Deserialize, Serialize};

/// One row of the domestic ETF listing, in normalized field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfEntry {
    pub symbol: String,
    pub name: String,
    /// Listing category code (1 = domestic market index, 2 = sector, ...).
    pub category: u32,
    pub price: f64,
    /// Daily change in percent.
    pub change_rate: f64,
    pub nav: Option<f64>,
    /// Three-month return in percent.
    pub three_month_return: Option<f64>,
    pub volume: u64,
    /// Traded value, in millions of KRW.
    pub amount: u64,
    /// Market capitalization, in hundreds of millions of KRW.
    pub market_cap: u64,
}

impl EtfEntry {
    /// Substring match against any keyword.
    pub fn name_contains_any(&self, keywords: &[String]) -> bool {
        keywords.iter().any(|k| self.name.contains(k.as_str()))
    }
}
