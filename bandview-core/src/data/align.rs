//! Secondary series alignment onto a primary trading calendar.
//!
//! The secondary is reindexed on exact date matches, then forward-filled
//! across the target positions, then the leading gap is back-filled with the
//! first matched value. Secondary dates off the target calendar never leak
//! in. The output has one point per target date unless no target date matches
//! the secondary at all.

use crate::data::schema::{date_column, TableSchema};
use crate::domain::SecondarySeries;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How an aligned value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fill {
    Exact,
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub fill: Fill,
}

/// A secondary series reindexed onto a primary calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    name: String,
    points: Vec<AlignedPoint>,
}

impl AlignedSeries {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[AlignedPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The secondary had no data at all; render it as absent, not as an error.
    pub fn is_unavailable(&self) -> bool {
        self.points.is_empty()
    }

    pub fn filled_count(&self) -> usize {
        self.points.iter().filter(|p| p.fill != Fill::Exact).count()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<NaiveDate> = self.points.iter().map(|p| p.date).collect();
        let df = DataFrame::new(vec![
            date_column("date", &dates)?,
            Column::from(Series::new("value".into(), self.values())),
        ])?;
        TableSchema::aligned().validate(&df)?;
        Ok(df)
    }
}

/// Reindex `secondary` onto `target_index`.
pub fn align(secondary: &SecondarySeries, target_index: &[NaiveDate]) -> AlignedSeries {
    let name = secondary.name().to_string();
    let by_date = secondary.by_date();
    let exact: Vec<Option<f64>> = target_index.iter().map(|d| by_date.get(d).copied()).collect();

    let Some(first) = exact.iter().flatten().next().copied() else {
        if !secondary.is_empty() && !target_index.is_empty() {
            tracing::debug!(series = %name, "no secondary date on the target calendar");
        }
        return AlignedSeries {
            name,
            points: Vec::new(),
        };
    };

    let mut last: Option<f64> = None;
    let points: Vec<AlignedPoint> = target_index
        .iter()
        .zip(exact)
        .map(|(&date, matched)| {
            let (value, fill) = match (matched, last) {
                (Some(v), _) => (v, Fill::Exact),
                (None, Some(v)) => (v, Fill::Forward),
                (None, None) => (first, Fill::Backward),
            };
            if matched.is_some() {
                last = matched;
            }
            AlignedPoint { date, value, fill }
        })
        .collect();

    let filled = points.iter().filter(|p| p.fill != Fill::Exact).count();
    if filled > 0 {
        tracing::debug!(series = %name, filled, total = points.len(), "filled calendar gaps");
    }

    AlignedSeries { name, points }
}
