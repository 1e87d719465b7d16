//! Fixed tabular schemas for the exported polars frames.

use chrono::NaiveDate;
use polars::prelude::*;

/// Expected columns and dtypes of one exported table.
pub struct TableSchema {
    schema: Schema,
}

fn float(name: &str) -> Field {
    Field::new(name.into(), DataType::Float64)
}

impl TableSchema {
    pub fn ohlcv() -> Self {
        Self {
            schema: Schema::from_iter(ohlcv_fields()),
        }
    }

    pub fn indicator() -> Self {
        let mut fields = ohlcv_fields();
        for name in [
            "ma", "std", "upper1", "lower1", "upper2", "lower2", "upper3", "lower3",
        ] {
            fields.push(float(name));
        }
        Self {
            schema: Schema::from_iter(fields),
        }
    }

    pub fn aligned() -> Self {
        Self {
            schema: Schema::from_iter(vec![
                Field::new("date".into(), DataType::Date),
                float("value"),
            ]),
        }
    }

    pub fn etf_ranking() -> Self {
        Self {
            schema: Schema::from_iter(vec![
                Field::new("symbol".into(), DataType::String),
                Field::new("name".into(), DataType::String),
                Field::new("volume".into(), DataType::UInt64),
                float("price"),
                float("change_rate"),
                float("nav"),
                Field::new("market_cap".into(), DataType::UInt64),
            ]),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Every expected column exists with the expected dtype.
    pub fn validate(&self, df: &DataFrame) -> PolarsResult<()> {
        let actual = df.schema();
        for field in self.schema.iter_fields() {
            let name = field.name().as_str();
            let dtype = actual
                .get(name)
                .ok_or_else(|| PolarsError::ColumnNotFound(name.to_string().into()))?;
            if dtype != field.dtype() {
                return Err(PolarsError::SchemaMismatch(
                    format!(
                        "column {name}: expected {:?}, got {:?}",
                        field.dtype(),
                        dtype
                    )
                    .into(),
                ));
            }
        }
        Ok(())
    }
}

fn ohlcv_fields() -> Vec<Field> {
    vec![
        Field::new("date".into(), DataType::Date),
        float("open"),
        float("high"),
        float("low"),
        float("close"),
        Field::new("volume".into(), DataType::UInt64),
    ]
}

/// Polars `Date` column (days since the Unix epoch).
pub fn date_column(name: &str, dates: &[NaiveDate]) -> PolarsResult<Column> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    let days: Vec<i32> = dates
        .iter()
        .map(|d| (*d - epoch).num_days() as i32)
        .collect();
    let series = Series::new(name.into(), days).cast(&DataType::Date)?;
    Ok(Column::from(series))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_schema_extends_ohlcv() {
        let ohlcv = TableSchema::ohlcv();
        let indicator = TableSchema::indicator();
        for field in ohlcv.schema().iter_fields() {
            assert!(indicator.schema().contains(field.name().as_str()));
        }
        for k in 1..=3 {
            assert!(indicator.schema().contains(&format!("upper{k}")));
            assert!(indicator.schema().contains(&format!("lower{k}")));
        }
    }

    #[test]
    fn validate_rejects_missing_column() {
        let df = DataFrame::new(vec![Column::from(Series::new(
            "open".into(),
            &[400.0],
        ))])
        .unwrap();
        assert!(TableSchema::ohlcv().validate(&df).is_err());
    }

    #[test]
    fn validate_rejects_wrong_type() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let df = DataFrame::new(vec![
            date_column("date", &[date]).unwrap(),
            Column::from(Series::new("value".into(), &["not_a_number"])),
        ])
        .unwrap();
        assert!(TableSchema::aligned().validate(&df).is_err());
    }

    #[test]
    fn date_column_is_date_typed() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 11).unwrap();
        let col = date_column("date", &[date]).unwrap();
        assert_eq!(col.dtype(), &DataType::Date);
    }
}
