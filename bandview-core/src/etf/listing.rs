//! Domestic ETF listing sources.

use crate::data::http::{HttpRequest, HttpTransport};
use crate::domain::EtfEntry;
use crate::error::{DataError, FetchError};
use serde::Deserialize;
use std::sync::Arc;

pub const NAVER_ETF_URL: &str = "https://finance.naver.com/api/sise/etfItemList.nhn";

/// Anything that can return the full ETF listing.
pub trait EtfListingSource: Send + Sync {
    fn name(&self) -> &str;

    /// Every listed ETF, in the source's own order.
    fn fetch_listing(&self) -> Result<Vec<EtfEntry>, DataError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingResponse {
    result_code: String,
    result: Option<ListingResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingResult {
    etf_item_list: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingItem {
    #[serde(rename = "itemcode")]
    item_code: String,
    #[serde(rename = "itemname")]
    item_name: String,
    #[serde(default)]
    etf_tab_code: u32,
    #[serde(default)]
    now_val: f64,
    #[serde(default)]
    change_rate: f64,
    #[serde(default)]
    nav: Option<f64>,
    #[serde(default)]
    three_month_earn_rate: Option<f64>,
    #[serde(rename = "quant", default)]
    quantity: u64,
    // The upstream key really is misspelled.
    #[serde(rename = "amonut", default)]
    amount: u64,
    #[serde(default)]
    market_sum: u64,
}

impl From<ListingItem> for EtfEntry {
    fn from(item: ListingItem) -> Self {
        EtfEntry {
            symbol: item.item_code,
            name: item.item_name,
            category: item.etf_tab_code,
            price: item.now_val,
            change_rate: item.change_rate,
            nav: item.nav,
            three_month_return: item.three_month_earn_rate,
            volume: item.quantity,
            amount: item.amount,
            market_cap: item.market_sum,
        }
    }
}

/// Naver Finance ETF listing.
pub struct NaverEtfListing {
    transport: Arc<dyn HttpTransport>,
}

impl NaverEtfListing {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn listing_request() -> HttpRequest {
        HttpRequest::get(NAVER_ETF_URL)
    }

    pub fn parse_listing(body: &str) -> Result<Vec<EtfEntry>, FetchError> {
        let resp: ListingResponse = serde_json::from_str(body).map_err(|e| {
            FetchError::ResponseFormatChanged(format!("failed to parse ETF listing: {e}"))
        })?;
        if resp.result_code != "success" {
            return Err(FetchError::Provider(format!(
                "ETF listing returned result code '{}'",
                resp.result_code
            )));
        }
        let result = resp
            .result
            .ok_or_else(|| FetchError::ResponseFormatChanged("missing 'result' object".into()))?;
        Ok(result.etf_item_list.into_iter().map(EtfEntry::from).collect())
    }
}

impl EtfListingSource for NaverEtfListing {
    fn name(&self) -> &str {
        "naver"
    }

    fn fetch_listing(&self) -> Result<Vec<EtfEntry>, DataError> {
        let request = Self::listing_request();
        let resp = self.transport.send(&request)?;
        if !resp.is_success() {
            return Err(FetchError::HttpStatus {
                status: resp.status,
                url: request.url,
            }
            .into());
        }
        let entries = Self::parse_listing(&resp.body)?;
        tracing::debug!(rows = entries.len(), "parsed ETF listing");
        Ok(entries)
    }
}
