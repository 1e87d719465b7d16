//! Volatility bands: rolling mean of close +/- k rolling standard deviations.
//!
//! Six bands per row: upper/lower at k = 1, 2, 3.
//!
//! Uses sample stddev (divide by N-1).
//! Lookback: window - 1. Rows inside the lookback, or whose window holds a NaN
//! close, have no rolling values.

use crate::data::schema::TableSchema;
use crate::domain::bar::ohlcv_columns;
use crate::domain::{OhlcvBar, OhlcvTable};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: usize = 20;

/// Band multipliers, innermost first.
pub const BAND_MULTIPLIERS: [f64; 3] = [1.0, 2.0, 3.0];

/// The six band levels of one row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub upper: [f64; 3],
    pub lower: [f64; 3],
}

impl Bands {
    fn around(mean: f64, std: f64) -> Self {
        Self {
            upper: BAND_MULTIPLIERS.map(|k| mean + k * std),
            lower: BAND_MULTIPLIERS.map(|k| mean - k * std),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub bar: OhlcvBar,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub bands: Option<Bands>,
}

impl IndicatorRow {
    /// Upper band at `k` standard deviations (k in 1..=3).
    pub fn upper(&self, k: usize) -> Option<f64> {
        let i = k.checked_sub(1)?;
        self.bands.and_then(|b| b.upper.get(i).copied())
    }

    /// Lower band at `k` standard deviations (k in 1..=3).
    pub fn lower(&self, k: usize) -> Option<f64> {
        let i = k.checked_sub(1)?;
        self.bands.and_then(|b| b.lower.get(i).copied())
    }
}

/// OHLCV table extended with rolling statistics and bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    symbol: String,
    window: usize,
    rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<chrono::NaiveDate> {
        self.rows.iter().map(|r| r.bar.date).collect()
    }

    /// Last `n` rows (all rows if fewer).
    pub fn tail(&self, n: usize) -> &[IndicatorRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = ohlcv_columns(self.rows.iter().map(|r| &r.bar))?;
        let mean: Vec<Option<f64>> = self.rows.iter().map(|r| r.mean).collect();
        let std: Vec<Option<f64>> = self.rows.iter().map(|r| r.std).collect();
        columns.push(Column::from(Series::new("ma".into(), mean)));
        columns.push(Column::from(Series::new("std".into(), std)));
        for k in 1..=BAND_MULTIPLIERS.len() {
            let upper: Vec<Option<f64>> = self.rows.iter().map(|r| r.upper(k)).collect();
            let lower: Vec<Option<f64>> = self.rows.iter().map(|r| r.lower(k)).collect();
            columns.push(Column::from(Series::new(format!("upper{k}").into(), upper)));
            columns.push(Column::from(Series::new(format!("lower{k}").into(), lower)));
        }

        let df = DataFrame::new(columns)?;
        TableSchema::indicator().validate(&df)?;
        Ok(df)
    }
}

/// Rolling mean, rolling sample std and the six bands over a trailing window.
///
/// Panics if `window == 0`.
pub fn compute_bands(ohlcv: &OhlcvTable, window: usize) -> IndicatorTable {
    assert!(window >= 1, "band window must be >= 1");

    let closes = ohlcv.closes();
    let rows = ohlcv
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (mean, std) = match trailing_window(&closes, i, window) {
                Some(slice) => {
                    let mean = slice.iter().sum::<f64>() / window as f64;
                    (Some(mean), sample_std(slice, mean))
                }
                None => (None, None),
            };
            let bands = mean.zip(std).map(|(m, s)| Bands::around(m, s));
            IndicatorRow {
                bar: bar.clone(),
                mean,
                std,
                bands,
            }
        })
        .collect();

    IndicatorTable {
        symbol: ohlcv.symbol().to_string(),
        window,
        rows,
    }
}

/// The `window` closes ending at `i`, if complete and NaN-free.
fn trailing_window(closes: &[f64], i: usize, window: usize) -> Option<&[f64]> {
    if i + 1 < window {
        return None;
    }
    let slice = &closes[i + 1 - window..=i];
    if slice.iter().any(|c| c.is_nan()) {
        return None;
    }
    Some(slice)
}

fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
