//! OHLCV bar and table: the normalized output of every provider adapter.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::schema::{date_column, TableSchema};

/// Canonical column names, identical for every provider.
pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// One trading day of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl OhlcvBar {
    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high is the top of the range, low the bottom.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Date-indexed OHLCV rows for one symbol.
///
/// Rows are strictly increasing by date. An empty table means "no trading in
/// the requested range" and is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvTable {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl OhlcvTable {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    /// Build a table from provider rows in any order.
    ///
    /// Sorts by date and keeps the first row seen for a duplicated date.
    pub fn from_bars(symbol: impl Into<String>, mut bars: Vec<OhlcvBar>) -> Self {
        let symbol = symbol.into();
        bars.sort_by_key(|b| b.date);
        let before = bars.len();
        bars.dedup_by_key(|b| b.date);
        if bars.len() != before {
            tracing::warn!(
                symbol = %symbol,
                dropped = before - bars.len(),
                "dropped duplicate trading dates"
            );
        }
        Self { symbol, bars }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The trading calendar of this table.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let df = DataFrame::new(ohlcv_columns(&self.bars)?)?;
        TableSchema::ohlcv().validate(&df)?;
        Ok(df)
    }
}

/// The six OHLCV columns (`date` first) shared by the OHLCV and indicator frames.
pub(crate) fn ohlcv_columns<'a, I>(bars: I) -> PolarsResult<Vec<Column>>
where
    I: IntoIterator<Item = &'a OhlcvBar>,
    I::IntoIter: Clone,
{
    let bars = bars.into_iter();
    let dates: Vec<NaiveDate> = bars.clone().map(|b| b.date).collect();
    let open: Vec<f64> = bars.clone().map(|b| b.open).collect();
    let high: Vec<f64> = bars.clone().map(|b| b.high).collect();
    let low: Vec<f64> = bars.clone().map(|b| b.low).collect();
    let close: Vec<f64> = bars.clone().map(|b| b.close).collect();
    let volume: Vec<u64> = bars.map(|b| b.volume).collect();

    Ok(vec![
        date_column("date", &dates)?,
        Column::from(Series::new("open".into(), open)),
        Column::from(Series::new("high".into(), high)),
        Column::from(Series::new("low".into(), low)),
        Column::from(Series::new("close".into(), close)),
        Column::from(Series::new("volume".into(), volume)),
    ])
}
