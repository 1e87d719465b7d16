//! Shared fixtures for integration tests: a canned transport and native
//! response bodies in each provider's own format.

#![allow(dead_code)]

use bandview_core::data::{HttpRequest, HttpResponse, HttpTransport};
use bandview_core::FetchError;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Mutex;

/// Replays a fixed response per URL prefix and records every request.
#[derive(Default)]
pub struct CannedTransport {
    routes: Vec<(String, Result<HttpResponse, String>)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl CannedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests whose URL starts with `prefix` (first match wins).
    pub fn route(mut self, prefix: &str, response: HttpResponse) -> Self {
        self.routes.push((prefix.to_string(), Ok(response)));
        self
    }

    /// Fail requests whose URL starts with `prefix` as unreachable.
    pub fn unreachable(mut self, prefix: &str) -> Self {
        self.routes.push((prefix.to_string(), Err(format!("{prefix} offline"))));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpTransport for CannedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.routes.iter().find(|(prefix, _)| request.url.starts_with(prefix)) {
            Some((_, Ok(resp))) => Ok(resp.clone()),
            Some((_, Err(msg))) => Err(FetchError::NetworkUnreachable(msg.clone())),
            None => Ok(HttpResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

pub const YAHOO_CHART: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
pub const YAHOO_KOSPI: &str = "https://query2.finance.yahoo.com/v8/finance/chart/^KS11";
pub const YAHOO_VIX: &str = "https://query2.finance.yahoo.com/v8/finance/chart/^VIX";
pub const KRX_DATA: &str = "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd";
pub const NAVER_ETF: &str = "https://finance.naver.com/api/sise/etfItemList.nhn";

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Consecutive calendar days starting at `start`.
pub fn days(start: &str, n: usize) -> Vec<NaiveDate> {
    let first = date(start);
    (0..n).map(|i| first + chrono::Duration::days(i as i64)).collect()
}

/// A v8 chart body with one bar per (date, close), stamped at 09:00 local KST.
pub fn yahoo_chart(symbol: &str, points: &[(NaiveDate, f64)]) -> HttpResponse {
    let offset = 9 * 3600;
    let timestamps: Vec<i64> = points
        .iter()
        .map(|(d, _)| d.and_hms_opt(9, 0, 0).unwrap().and_utc().timestamp() - offset)
        .collect();
    let closes: Vec<f64> = points.iter().map(|(_, c)| *c).collect();
    let opens: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
    let highs: Vec<f64> = closes.iter().map(|c| c + 2.0).collect();
    let lows: Vec<f64> = closes.iter().map(|c| c - 2.0).collect();
    let volumes: Vec<u64> = vec![1_000; points.len()];
    let body = json!({
        "chart": {
            "result": [{
                "meta": { "symbol": symbol, "gmtoffset": offset },
                "timestamp": timestamps,
                "indicators": { "quote": [{
                    "open": opens,
                    "high": highs,
                    "low": lows,
                    "close": closes,
                    "volume": volumes,
                }]}
            }],
            "error": null
        }
    });
    HttpResponse::ok(body.to_string())
}

/// A chart body for a range with no trading.
pub fn yahoo_empty_chart(symbol: &str) -> HttpResponse {
    let body = json!({
        "chart": {
            "result": [{
                "meta": { "symbol": symbol, "gmtoffset": 32400 },
                "indicators": { "quote": [{}] }
            }],
            "error": null
        }
    });
    HttpResponse::ok(body.to_string())
}

pub fn yahoo_not_found() -> HttpResponse {
    let body = json!({
        "chart": {
            "result": null,
            "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
        }
    });
    HttpResponse {
        status: 404,
        body: body.to_string(),
    }
}

/// A KRX index body, newest first, with comma-grouped numbers.
pub fn krx_index(points: &[(NaiveDate, f64)]) -> HttpResponse {
    let rows: Vec<serde_json::Value> = points
        .iter()
        .rev()
        .map(|(d, c)| {
            json!({
                "TRD_DD": d.format("%Y/%m/%d").to_string(),
                "CLSPRC_IDX": group_thousands(*c),
                "FLUC_TP_CD": "1",
                "OPNPRC_IDX": group_thousands(c - 1.0),
                "HGPRC_IDX": group_thousands(c + 2.0),
                "LWPRC_IDX": group_thousands(c - 2.0),
                "ACC_TRDVOL": "412,345",
                "ACC_TRDVAL": "9,876,543",
            })
        })
        .collect();
    HttpResponse::ok(json!({ "output": rows, "CURRENT_DATETIME": "2024.01.31 PM 06:00:00" }).to_string())
}

fn group_thousands(v: f64) -> String {
    let raw = format!("{v:.2}");
    let (int, frac) = raw.split_once('.').unwrap();
    let mut grouped = String::new();
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}.{frac}")
}

/// A Naver ETF listing body from (code, name, volume) triples.
pub fn naver_listing(items: &[(&str, &str, u64)]) -> HttpResponse {
    let list: Vec<serde_json::Value> = items
        .iter()
        .map(|(code, name, quant)| {
            json!({
                "itemcode": code,
                "etfTabCode": 1,
                "itemname": name,
                "nowVal": 10_000,
                "risefall": "2",
                "changeVal": 50,
                "changeRate": 0.5,
                "nav": 10_010.0,
                "threeMonthEarnRate": 1.2,
                "quant": quant,
                "amonut": 100,
                "marketSum": 5_000,
            })
        })
        .collect();
    HttpResponse::ok(json!({ "resultCode": "success", "result": { "etfItemList": list } }).to_string())
}
