//! Top-N ETF ranking by volume.
//!
//! Inverse, leveraged and currency-hedged products are excluded by substring
//! match on the display name. Ranking uses a stable sort, so equal volumes keep
//! listing order and `top(n)` is always a prefix of `top(n + 1)`.

use super::listing::EtfListingSource;
use crate::data::schema::TableSchema;
use crate::domain::EtfEntry;
use crate::error::DataError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Inverse, leveraged, currency-hedged.
pub const DEFAULT_EXCLUDE_KEYWORDS: [&str; 3] = ["인버스", "레버리지", "(H)"];

pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtfFilter {
    exclude_keywords: Vec<String>,
}

impl Default for EtfFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDE_KEYWORDS.iter().map(|k| k.to_string()))
    }
}

impl EtfFilter {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            exclude_keywords: keywords.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.exclude_keywords
    }

    pub fn is_excluded(&self, entry: &EtfEntry) -> bool {
        entry.name_contains_any(&self.exclude_keywords)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtfRankingTable {
    entries: Vec<EtfEntry>,
}

impl EtfRankingTable {
    pub fn entries(&self) -> &[EtfEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let e = &self.entries;
        let symbol: Vec<&str> = e.iter().map(|x| x.symbol.as_str()).collect();
        let name: Vec<&str> = e.iter().map(|x| x.name.as_str()).collect();
        let volume: Vec<u64> = e.iter().map(|x| x.volume).collect();
        let price: Vec<f64> = e.iter().map(|x| x.price).collect();
        let change_rate: Vec<f64> = e.iter().map(|x| x.change_rate).collect();
        let nav: Vec<Option<f64>> = e.iter().map(|x| x.nav).collect();
        let market_cap: Vec<u64> = e.iter().map(|x| x.market_cap).collect();

        let df = DataFrame::new(vec![
            Column::from(Series::new("symbol".into(), symbol)),
            Column::from(Series::new("name".into(), name)),
            Column::from(Series::new("volume".into(), volume)),
            Column::from(Series::new("price".into(), price)),
            Column::from(Series::new("change_rate".into(), change_rate)),
            Column::from(Series::new("nav".into(), nav)),
            Column::from(Series::new("market_cap".into(), market_cap)),
        ])?;
        TableSchema::etf_ranking().validate(&df)?;
        Ok(df)
    }
}

/// Filter, stable-sort by volume descending, truncate to `n`.
pub fn rank(entries: Vec<EtfEntry>, filter: &EtfFilter, n: usize) -> EtfRankingTable {
    let total = entries.len();
    let mut kept: Vec<EtfEntry> = entries.into_iter().filter(|e| !filter.is_excluded(e)).collect();
    tracing::debug!(total, excluded = total - kept.len(), "filtered ETF listing");
    kept.sort_by(|a, b| b.volume.cmp(&a.volume));
    kept.truncate(n);
    EtfRankingTable { entries: kept }
}

/// Fetch the listing and rank it. An all-excluded listing is an empty table.
pub fn top_etfs(
    source: &dyn EtfListingSource,
    filter: &EtfFilter,
    n: usize,
) -> Result<EtfRankingTable, DataError> {
    let listing = source.fetch_listing()?;
    Ok(rank(listing, filter, n))
}
