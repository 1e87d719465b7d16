//! Single-column date-indexed series (e.g. VIX close).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bar::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A secondary series on its own calendar.
///
/// Points are sorted by date, unique, and never NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondarySeries {
    name: String,
    points: Vec<SeriesPoint>,
}

impl SecondarySeries {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Sorts, drops NaN values and keeps the first point of a duplicated date.
    pub fn from_points(name: impl Into<String>, mut points: Vec<SeriesPoint>) -> Self {
        points.retain(|p| !p.value.is_nan());
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self {
            name: name.into(),
            points,
        }
    }

    /// Closing prices of a bar sequence.
    pub fn from_closes(name: impl Into<String>, bars: &[OhlcvBar]) -> Self {
        let points = bars
            .iter()
            .map(|b| SeriesPoint {
                date: b.date,
                value: b.close,
            })
            .collect();
        Self::from_points(name, points)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn by_date(&self) -> BTreeMap<NaiveDate, f64> {
        self.points.iter().map(|p| (p.date, p.value)).collect()
    }
}
