//! Korea Exchange adapter.
//!
//! Serves only the domestic indices in its symbol table. Any other symbol is a
//! configuration error raised before a request is made. KRX publishes no VIX,
//! so that series is delegated to an inner Yahoo adapter.
//!
//! Native rows use KRX field codes (`TRD_DD`, `OPNPRC_IDX`, ...), slash dates,
//! thousands separators and newest-first ordering.

use super::http::{HttpRequest, HttpTransport};
use super::provider::{MarketDataProvider, SourceKind};
use super::symbols::SymbolMap;
use super::yahoo::YahooProvider;
use crate::domain::{OhlcvBar, OhlcvTable, SecondarySeries};
use crate::error::{check_date_range, ConfigError, DataError, FetchError};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

pub const DATA_URL: &str = "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";
const REFERER: &str = "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader";
const INDEX_OHLCV_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT00301";

#[derive(Debug, Deserialize)]
struct IndexResponse {
    output: Option<Vec<IndexRow>>,
}

#[derive(Debug, Deserialize)]
struct IndexRow {
    #[serde(rename = "TRD_DD")]
    trade_date: String,
    #[serde(rename = "OPNPRC_IDX", default)]
    open: String,
    #[serde(rename = "HGPRC_IDX", default)]
    high: String,
    #[serde(rename = "LWPRC_IDX", default)]
    low: String,
    #[serde(rename = "CLSPRC_IDX", default)]
    close: String,
    #[serde(rename = "ACC_TRDVOL", default)]
    volume: String,
}

pub struct KrxProvider {
    transport: Arc<dyn HttpTransport>,
    symbols: SymbolMap,
    vix: YahooProvider,
}

impl KrxProvider {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let vix = YahooProvider::new(Arc::clone(&transport));
        Self::with_symbols(transport, SymbolMap::krx_default(), vix)
    }

    pub fn with_symbols(
        transport: Arc<dyn HttpTransport>,
        symbols: SymbolMap,
        vix: YahooProvider,
    ) -> Self {
        Self {
            transport,
            symbols,
            vix,
        }
    }

    /// Form request for a four-digit KRX index ticker (`1001` → group `1`, code `001`).
    pub fn index_request(ticker: &str, start: NaiveDate, end: NaiveDate) -> HttpRequest {
        let (group, code) = ticker.split_at(ticker.len().min(1));
        HttpRequest::post_form(DATA_URL)
            .header("Referer", REFERER)
            .param("bld", INDEX_OHLCV_BLD)
            .param("indIdx", group)
            .param("indIdx2", code)
            .param("strtDd", start.format("%Y%m%d").to_string())
            .param("endDd", end.format("%Y%m%d").to_string())
            .param("share", "2")
            .param("money", "3")
            .param("csvxls_isNo", "false")
    }

    /// Parse a KRX index body into bars (any order; the table sorts).
    pub fn parse_index(ticker: &str, body: &str) -> Result<Vec<OhlcvBar>, FetchError> {
        let resp: IndexResponse = serde_json::from_str(body).map_err(|e| {
            FetchError::ResponseFormatChanged(format!("failed to parse KRX index {ticker}: {e}"))
        })?;
        let rows = resp
            .output
            .ok_or_else(|| FetchError::ResponseFormatChanged("missing 'output' array".into()))?;

        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            let date = NaiveDate::parse_from_str(row.trade_date.trim(), "%Y/%m/%d").map_err(|e| {
                FetchError::ResponseFormatChanged(format!(
                    "invalid trade date '{}': {e}",
                    row.trade_date
                ))
            })?;
            let Some(close) = parse_number(&row.close) else {
                continue;
            };
            bars.push(OhlcvBar {
                date,
                open: parse_number(&row.open).unwrap_or(f64::NAN),
                high: parse_number(&row.high).unwrap_or(f64::NAN),
                low: parse_number(&row.low).unwrap_or(f64::NAN),
                close,
                volume: parse_number(&row.volume).map(|v| v.max(0.0) as u64).unwrap_or(0),
            });
        }
        Ok(bars)
    }
}

/// `"2,669.81"` → 2669.81. Blank and `-` are missing.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse().ok()
}

impl MarketDataProvider for KrxProvider {
    fn name(&self) -> &str {
        "krx"
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
        let ticker = self
            .symbols
            .resolve_strict(symbol)
            .ok_or_else(|| ConfigError::UnsupportedSymbol {
                symbol: symbol.to_string(),
                provider: SourceKind::Krx.name().to_string(),
                alternate: SourceKind::Krx.alternate().name().to_string(),
            })?;
        check_date_range(start, end)?;

        let resp = self.transport.send(&Self::index_request(ticker, start, end))?;
        if !resp.is_success() {
            return Err(FetchError::HttpStatus {
                status: resp.status,
                url: DATA_URL.to_string(),
            }
            .into());
        }

        let bars = Self::parse_index(ticker, &resp.body)?;
        tracing::debug!(ticker, rows = bars.len(), "parsed krx index");
        Ok(OhlcvTable::from_bars(symbol, bars))
    }

    fn get_vix_history(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SecondarySeries, DataError> {
        self.vix.get_vix_history(start, end)
    }
}
