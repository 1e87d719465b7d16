//! Yahoo Finance adapter.
//!
//! Fetches daily bars from the v8 chart API. Readable index names are mapped
//! through the adapter's [`SymbolMap`]; unknown names pass through as raw
//! tickers. Yahoo also serves the VIX series for both adapters.

use super::http::{HttpRequest, HttpTransport};
use super::provider::MarketDataProvider;
use super::symbols::SymbolMap;
use crate::domain::{OhlcvBar, OhlcvTable, SecondarySeries};
use crate::error::{check_date_range, DataError, FetchError};
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;

pub const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
pub const VIX_TICKER: &str = "^VIX";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

// A range with no trading returns `"quote": [{}]`.
#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    transport: Arc<dyn HttpTransport>,
    symbols: SymbolMap,
}

impl YahooProvider {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_symbols(transport, SymbolMap::yahoo_default())
    }

    pub fn with_symbols(transport: Arc<dyn HttpTransport>, symbols: SymbolMap) -> Self {
        Self { transport, symbols }
    }

    /// Chart request covering `start 00:00` to `end 23:59:59` UTC.
    pub fn chart_request(
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HttpRequest, FetchError> {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        let end_ts = end.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc().timestamp();
        Ok(HttpRequest::get(chart_url(ticker)?)
            .param("period1", start_ts.to_string())
            .param("period2", end_ts.to_string())
            .param("interval", "1d"))
    }

    /// Parse a chart body into bars within `[start, end]`.
    ///
    /// Rows where every quote field is null are non-trading days and skipped.
    /// A result without timestamps is an empty range, not an error.
    pub fn parse_chart(
        ticker: &str,
        body: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FetchError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            FetchError::ResponseFormatChanged(format!("failed to parse chart for {ticker}: {e}"))
        })?;

        let result = match resp.chart.result {
            Some(result) => result,
            None => return Err(chart_error(ticker, resp.chart.error)),
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormatChanged("result array is empty".into()))?;

        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let offset = data.meta.map(|m| m.gmtoffset).unwrap_or(0);
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    FetchError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }
            if date < start || date > end {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        Ok(bars)
    }

    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, DataError> {
        check_date_range(start, end)?;
        let request = Self::chart_request(ticker, start, end)?;
        let resp = self.transport.send(&request)?;

        if !resp.is_success() {
            // Yahoo answers unknown tickers with 404 and a chart error body.
            if let Ok(parsed) = serde_json::from_str::<ChartResponse>(&resp.body) {
                if parsed.chart.error.is_some() {
                    return Err(chart_error(ticker, parsed.chart.error).into());
                }
            }
            if resp.status == 404 {
                return Err(FetchError::SymbolNotFound {
                    symbol: ticker.to_string(),
                }
                .into());
            }
            return Err(FetchError::HttpStatus {
                status: resp.status,
                url: request.url,
            }
            .into());
        }

        let bars = Self::parse_chart(ticker, &resp.body, start, end)?;
        tracing::debug!(ticker, rows = bars.len(), "parsed yahoo chart");
        Ok(bars)
    }
}

fn chart_error(ticker: &str, error: Option<ChartError>) -> FetchError {
    match error {
        Some(err) if err.code == "Not Found" => FetchError::SymbolNotFound {
            symbol: ticker.to_string(),
        },
        Some(err) => FetchError::Provider(format!("{}: {}", err.code, err.description)),
        None => FetchError::ResponseFormatChanged("empty result with no error".into()),
    }
}

/// `CHART_URL` with `ticker` appended as a single path segment.
fn chart_url(ticker: &str) -> Result<String, FetchError> {
    let invalid = |detail: String| FetchError::Provider(format!("invalid chart url: {detail}"));
    let mut url = Url::parse(CHART_URL).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid(CHART_URL.to_string()))?
        .push(ticker);
    Ok(url.into())
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn symbols(&self) -> &SymbolMap {
        &self.symbols
    }

    fn get_index_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvTable, DataError> {
        let ticker = self.symbols.resolve(symbol);
        let bars = self.fetch_bars(ticker, start, end)?;
        Ok(OhlcvTable::from_bars(symbol, bars))
    }

    fn get_vix_history(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SecondarySeries, DataError> {
        let bars = self.fetch_bars(VIX_TICKER, start, end)?;
        Ok(SecondarySeries::from_closes("VIX", &bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn ticker_is_one_encoded_path_segment() {
        assert_eq!(chart_url("^KS11").unwrap(), format!("{CHART_URL}/^KS11"));
        assert_eq!(chart_url("US500").unwrap(), format!("{CHART_URL}/US500"));
        assert_eq!(chart_url("005930.KS").unwrap(), format!("{CHART_URL}/005930.KS"));
        assert_eq!(chart_url("^KS 11").unwrap(), format!("{CHART_URL}/^KS%2011"));
        assert_eq!(chart_url("US?x").unwrap(), format!("{CHART_URL}/US%3Fx"));
        // A slash stays inside the segment instead of adding a path level.
        assert_eq!(chart_url("A/B").unwrap(), format!("{CHART_URL}/A%2FB"));
    }

    #[test]
    fn chart_request_covers_whole_end_day() {
        let req = YahooProvider::chart_request("^VIX", date("2024-01-02"), date("2024-01-02")).unwrap();
        assert!(req.url.ends_with("/chart/^VIX"));
        let p1: i64 = req.param_value("period1").unwrap().parse().unwrap();
        let p2: i64 = req.param_value("period2").unwrap().parse().unwrap();
        assert_eq!(p2 - p1, 86_399);
        assert_eq!(req.param_value("interval"), Some("1d"));
    }

    #[test]
    fn parse_uses_exchange_offset_for_dates() {
        // 2024-01-02 00:00 KST is 2024-01-01 15:00 UTC.
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":32400},
            "timestamp":[1704121200],
            "indicators":{"quote":[{"open":[2600.0],"high":[2680.0],"low":[2590.0],"close":[2669.8],"volume":[400000]}]}
        }],"error":null}}"#;
        let bars =
            YahooProvider::parse_chart("^KS11", body, date("2024-01-01"), date("2024-01-31"))
                .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date("2024-01-02"));
        assert_eq!(bars[0].close, 2669.8);
    }

    #[test]
    fn parse_skips_all_null_rows() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1704153600,1704240000],
            "indicators":{"quote":[{"open":[null,1.0],"high":[null,2.0],"low":[null,0.5],"close":[null,1.5],"volume":[null,10]}]}
        }],"error":null}}"#;
        let bars =
            YahooProvider::parse_chart("X", body, date("2024-01-01"), date("2024-01-31")).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, 10);
    }

    #[test]
    fn parse_without_timestamps_is_empty() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        let bars =
            YahooProvider::parse_chart("X", body, date("2024-01-01"), date("2024-01-31")).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn parse_not_found_is_symbol_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = YahooProvider::parse_chart("NOPE", body, date("2024-01-01"), date("2024-01-31"))
            .unwrap_err();
        assert!(matches!(err, FetchError::SymbolNotFound { ref symbol } if symbol == "NOPE"));
    }

    #[test]
    fn parse_garbage_is_format_error() {
        let err = YahooProvider::parse_chart("X", "<html>", date("2024-01-01"), date("2024-01-31"))
            .unwrap_err();
        assert!(matches!(err, FetchError::ResponseFormatChanged(_)));
    }

    #[test]
    fn parse_drops_rows_outside_range() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1704153600,1704240000],
            "indicators":{"quote":[{"open":[1.0,1.0],"high":[2.0,2.0],"low":[0.5,0.5],"close":[1.5,1.6],"volume":[10,11]}]}
        }],"error":null}}"#;
        // 1704153600 = 2024-01-02, 1704240000 = 2024-01-03 (UTC)
        let bars =
            YahooProvider::parse_chart("X", body, date("2024-01-02"), date("2024-01-02")).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date("2024-01-02"));
    }
}
