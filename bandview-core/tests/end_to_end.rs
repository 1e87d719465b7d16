//! Full dashboard requests over a canned transport.

mod common;

use bandview_core::data::Fill;
use bandview_core::{Dashboard, DashboardConfig, SecondaryStatus};
use common::*;
use std::sync::Arc;

fn alternating_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| if i % 2 == 0 { 100.0 } else { 110.0 }).collect()
}

#[test]
fn alternating_series_defines_bands_from_row_twenty() {
    let dates = days("2024-01-01", 25);
    let points: Vec<_> = dates.iter().copied().zip(alternating_closes(25)).collect();
    let transport = Arc::new(CannedTransport::new().route(YAHOO_KOSPI, yahoo_chart("^KS11", &points)));
    let dashboard = Dashboard::from_config(&DashboardConfig::default(), transport);

    let view = dashboard
        .index_view("KOSPI", dates[0], dates[24], false)
        .unwrap();
    let rows = view.indicators.rows();
    assert_eq!(rows.len(), 25);

    // 1-based rows 1..=19 are inside the lookback.
    assert!(rows[..19].iter().all(|r| r.bands.is_none()));

    // Any 20 consecutive alternating closes hold ten of each value.
    let expected_std = (500.0_f64 / 19.0).sqrt();
    for row in &rows[19..] {
        let mean = row.mean.unwrap();
        let std = row.std.unwrap();
        assert!((mean - 105.0).abs() < 1e-9, "mean {mean}");
        assert!((std - expected_std).abs() < 1e-9, "std {std}");
        assert!(std > 0.0);
        assert!((row.upper(2).unwrap() - (105.0 + 2.0 * expected_std)).abs() < 1e-9);
        assert!((row.lower(3).unwrap() - (105.0 - 3.0 * expected_std)).abs() < 1e-9);
    }
}

#[test]
fn vix_overlay_is_forward_and_back_filled() {
    let dates = days("2024-01-01", 5);
    let index_points: Vec<_> = dates.iter().map(|d| (*d, 2500.0)).collect();
    // VIX misses the first and third index dates.
    let vix_points = vec![(dates[1], 13.0), (dates[3], 15.0), (dates[4], 16.0)];
    let transport = Arc::new(
        CannedTransport::new()
            .route(YAHOO_KOSPI, yahoo_chart("^KS11", &index_points))
            .route(YAHOO_VIX, yahoo_chart("^VIX", &vix_points)),
    );
    let dashboard = Dashboard::from_config(&DashboardConfig::default(), transport);

    let view = dashboard.index_view("KOSPI", dates[0], dates[4], true).unwrap();
    let vix = view.vix.series().expect("vix available");

    assert_eq!(vix.len(), view.indicators.len());
    assert_eq!(vix.values(), vec![13.0, 13.0, 13.0, 15.0, 16.0]);
    let fills: Vec<Fill> = vix.points().iter().map(|p| p.fill).collect();
    assert_eq!(
        fills,
        vec![Fill::Backward, Fill::Exact, Fill::Forward, Fill::Exact, Fill::Exact]
    );
}

#[test]
fn krx_source_with_vix_outage_still_returns_bands() {
    let dates = days("2024-01-01", 3);
    let points: Vec<_> = dates.iter().map(|d| (*d, 2600.0)).collect();
    let transport = Arc::new(
        CannedTransport::new()
            .route(KRX_DATA, krx_index(&points))
            .unreachable(YAHOO_VIX),
    );
    let config = DashboardConfig::from_toml_str("source = \"krx\"\n[indicator]\nwindow = 2").unwrap();
    let dashboard = Dashboard::from_config(&config, transport);

    let view = dashboard.index_view("KOSPI", dates[0], dates[2], true).unwrap();
    assert_eq!(view.indicators.len(), 3);
    assert_eq!(view.indicators.window(), 2);
    assert!(matches!(view.vix, SecondaryStatus::Failed(ref e) if e.is_fetch()));
}

#[test]
fn cached_dashboard_fetches_once() {
    let dates = days("2024-01-01", 3);
    let points: Vec<_> = dates.iter().map(|d| (*d, 2600.0)).collect();
    let transport = Arc::new(CannedTransport::new().route(YAHOO_KOSPI, yahoo_chart("^KS11", &points)));
    let config = DashboardConfig::from_toml_str("[cache]\nenabled = true\nttl_secs = 600").unwrap();
    let dashboard = Dashboard::from_config(&config, transport.clone());

    for _ in 0..3 {
        dashboard.index_view("KOSPI", dates[0], dates[2], false).unwrap();
    }
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn etf_ranking_excludes_and_orders_by_volume() {
    let transport = Arc::new(CannedTransport::new().route(
        NAVER_ETF,
        naver_listing(&[
            ("069500", "KODEX 200", 4_000_000),
            ("252670", "KODEX 200선물인버스2X", 90_000_000),
            ("122630", "KODEX 레버리지", 20_000_000),
            ("133690", "TIGER 미국나스닥100", 1_500_000),
            ("448290", "TIGER 미국S&P500(H)", 3_000_000),
            ("102110", "TIGER 200", 2_000_000),
        ]),
    ));
    let dashboard = Dashboard::from_config(&DashboardConfig::default(), transport);

    let table = dashboard.top_etfs(3).unwrap();
    let symbols: Vec<&str> = table.entries().iter().map(|e| e.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["069500", "102110", "133690"]);

    let df = table.to_dataframe().unwrap();
    assert_eq!(df.height(), 3);
}

#[test]
fn etf_listing_outage_is_fetch_error() {
    let transport = Arc::new(CannedTransport::new().unreachable(NAVER_ETF));
    let dashboard = Dashboard::from_config(&DashboardConfig::default(), transport);
    assert!(dashboard.top_etfs(20).unwrap_err().is_fetch());
}
