//! One dashboard request: index bands plus the optional VIX overlay and the
//! ETF ranking.

use crate::config::DashboardConfig;
use crate::data::align::{align, AlignedSeries};
use crate::data::http::HttpTransport;
use crate::data::provider::{build_provider, MarketDataProvider};
use crate::error::DataError;
use crate::etf::{top_etfs, EtfFilter, EtfListingSource, EtfRankingTable, NaverEtfListing};
use crate::indicators::{compute_bands, IndicatorTable};
use chrono::NaiveDate;
use std::sync::Arc;

/// What happened to the secondary (VIX) series of a view.
#[derive(Debug)]
pub enum SecondaryStatus {
    NotRequested,
    /// The index had no rows, so there was no calendar to align onto.
    Skipped,
    Available(AlignedSeries),
    /// The provider answered but had no data in range.
    Unavailable,
    /// The secondary fetch failed; the index view is still valid.
    Failed(DataError),
}

impl SecondaryStatus {
    pub fn series(&self) -> Option<&AlignedSeries> {
        match self {
            SecondaryStatus::Available(series) => Some(series),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct IndexView {
    pub indicators: IndicatorTable,
    pub vix: SecondaryStatus,
}

pub struct Dashboard {
    provider: Box<dyn MarketDataProvider>,
    etf_source: Box<dyn EtfListingSource>,
    window: usize,
    etf_filter: EtfFilter,
}

impl Dashboard {
    /// Panics if `window == 0`.
    pub fn new(
        provider: Box<dyn MarketDataProvider>,
        etf_source: Box<dyn EtfListingSource>,
        window: usize,
        etf_filter: EtfFilter,
    ) -> Self {
        assert!(window >= 1, "band window must be >= 1");
        Self {
            provider,
            etf_source,
            window,
            etf_filter,
        }
    }

    /// Wire the configured source and the Naver listing onto one transport.
    pub fn from_config(config: &DashboardConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let provider = build_provider(config.source, config, Arc::clone(&transport));
        Self::new(
            provider,
            Box::new(NaverEtfListing::new(transport)),
            config.indicator.window,
            config.etf_filter(),
        )
    }

    pub fn provider(&self) -> &dyn MarketDataProvider {
        self.provider.as_ref()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Fetch `symbol`, compute its bands and, if asked, overlay VIX.
    ///
    /// Index failures propagate. VIX failures are reported on the view.
    pub fn index_view(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        with_vix: bool,
    ) -> Result<IndexView, DataError> {
        let ohlcv = self.provider.get_index_ohlcv(symbol, start, end)?;
        let indicators = compute_bands(&ohlcv, self.window);

        let vix = if !with_vix {
            SecondaryStatus::NotRequested
        } else if ohlcv.is_empty() {
            SecondaryStatus::Skipped
        } else {
            match self.provider.get_vix_history(start, end) {
                Ok(series) => {
                    let aligned = align(&series, &indicators.dates());
                    if aligned.is_unavailable() {
                        SecondaryStatus::Unavailable
                    } else {
                        SecondaryStatus::Available(aligned)
                    }
                }
                Err(err) => {
                    tracing::warn!(provider = self.provider.name(), error = %err, "VIX unavailable");
                    SecondaryStatus::Failed(err)
                }
            }
        };

        tracing::debug!(symbol, rows = indicators.len(), window = self.window, "built index view");
        Ok(IndexView { indicators, vix })
    }

    pub fn top_etfs(&self, n: usize) -> Result<EtfRankingTable, DataError> {
        top_etfs(self.etf_source.as_ref(), &self.etf_filter, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::symbols::SymbolMap;
    use crate::domain::{EtfEntry, OhlcvTable, SecondarySeries, SeriesPoint};
    use crate::error::FetchError;
    use crate::indicators::make_table;

    struct StubProvider {
        symbols: SymbolMap,
        table: OhlcvTable,
        vix: Option<SecondarySeries>,
    }

    impl MarketDataProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn symbols(&self) -> &SymbolMap {
            &self.symbols
        }

        fn get_index_ohlcv(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<OhlcvTable, DataError> {
            Ok(self.table.clone())
        }

        fn get_vix_history(&self, _: NaiveDate, _: NaiveDate) -> Result<SecondarySeries, DataError> {
            self.vix
                .clone()
                .ok_or_else(|| FetchError::NetworkUnreachable("vix down".into()).into())
        }
    }

    struct EmptyListing;

    impl EtfListingSource for EmptyListing {
        fn name(&self) -> &str {
            "empty"
        }

        fn fetch_listing(&self) -> Result<Vec<EtfEntry>, DataError> {
            Ok(Vec::new())
        }
    }

    fn dashboard(table: OhlcvTable, vix: Option<SecondarySeries>) -> Dashboard {
        let provider = StubProvider {
            symbols: SymbolMap::default(),
            table,
            vix,
        };
        Dashboard::new(Box::new(provider), Box::new(EmptyListing), 3, EtfFilter::default())
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
    }

    #[test]
    fn vix_is_aligned_to_index_calendar() {
        let table = make_table(&[1.0, 2.0, 3.0, 4.0]);
        let first = table.first_date().unwrap();
        let vix = SecondarySeries::from_points(
            "VIX",
            vec![SeriesPoint {
                date: first,
                value: 13.0,
            }],
        );
        let (start, end) = range();
        let view = dashboard(table, Some(vix)).index_view("X", start, end, true).unwrap();
        let series = view.vix.series().unwrap();
        assert_eq!(series.len(), 4);
        assert!(series.values().iter().all(|&v| v == 13.0));
    }

    #[test]
    fn vix_failure_keeps_index_view() {
        let (start, end) = range();
        let view = dashboard(make_table(&[1.0, 2.0, 3.0]), None)
            .index_view("X", start, end, true)
            .unwrap();
        assert_eq!(view.indicators.len(), 3);
        assert!(matches!(view.vix, SecondaryStatus::Failed(ref e) if e.is_fetch()));
    }

    #[test]
    fn empty_vix_is_unavailable() {
        let (start, end) = range();
        let view = dashboard(make_table(&[1.0]), Some(SecondarySeries::empty("VIX")))
            .index_view("X", start, end, true)
            .unwrap();
        assert!(matches!(view.vix, SecondaryStatus::Unavailable));
    }

    #[test]
    fn empty_index_skips_vix() {
        let (start, end) = range();
        let view = dashboard(OhlcvTable::empty("X"), None)
            .index_view("X", start, end, true)
            .unwrap();
        assert!(view.indicators.is_empty());
        assert!(matches!(view.vix, SecondaryStatus::Skipped));
    }

    #[test]
    fn vix_not_requested() {
        let (start, end) = range();
        let view = dashboard(make_table(&[1.0]), None)
            .index_view("X", start, end, false)
            .unwrap();
        assert!(matches!(view.vix, SecondaryStatus::NotRequested));
    }
}
