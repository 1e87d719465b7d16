//! Bandview CLI: volatility bands, VIX overlay and ETF ranking in the terminal.
//!
//! Commands:
//! - `index`: fetch an index, compute its bands, optionally overlay VIX
//! - `etfs`: top domestic ETFs by volume, minus inverse/leveraged/hedged products
//! - `indices`: list the readable index names a source understands

use anyhow::{bail, Context, Result};
use bandview_core::data::{default_transport, SourceKind};
use bandview_core::indicators::IndicatorRow;
use bandview_core::{Dashboard, DashboardConfig, IndexView, SecondaryStatus};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bandview",
    about = "Bandview CLI: index volatility bands and ETF volume ranking"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an index and print its rolling mean, std and bands.
    Index {
        /// Readable index name (e.g. KOSPI, "S&P 500") or provider ticker.
        name: String,

        /// Data source: yahoo or krx. Overrides the config file.
        #[arg(long)]
        source: Option<SourceKind>,

        /// Start date (YYYY-MM-DD). Defaults to one year before the end date.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Rolling window in trading days. Overrides the config file.
        #[arg(long)]
        window: Option<usize>,

        /// Overlay VIX aligned to the index calendar.
        #[arg(long, default_value_t = false)]
        vix: bool,

        /// Number of most recent rows to print.
        #[arg(long, default_value_t = 10)]
        tail: usize,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Rank domestic ETFs by volume.
    Etfs {
        /// Number of ETFs to show. Overrides the config file.
        #[arg(long)]
        top: Option<usize>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the index names a source maps to tickers.
    Indices {
        /// Data source: yahoo or krx. Overrides the config file.
        #[arg(long)]
        source: Option<SourceKind>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    tracing::debug!(source = %config.source, window = config.indicator.window, "configuration ready");

    match cli.command {
        Commands::Index {
            name,
            source,
            start,
            end,
            window,
            vix,
            tail,
            json,
        } => {
            if let Some(source) = source {
                config.source = source;
            }
            if let Some(window) = window {
                config.indicator.window = window;
            }
            config.validate()?;
            run_index(&config, &name, start.as_deref(), end.as_deref(), vix, tail, json)
        }
        Commands::Etfs { top, json } => {
            if let Some(top) = top {
                config.etf.top_n = top;
            }
            config.validate()?;
            run_etfs(&config, json)
        }
        Commands::Indices { source } => {
            if let Some(source) = source {
                config.source = source;
            }
            run_indices(&config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(DashboardConfig::default()),
    }
}

fn parse_date(raw: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{s}'"))
    })
    .transpose()
}

fn dashboard(config: &DashboardConfig) -> Result<Dashboard> {
    let transport = default_transport(config)?;
    Ok(Dashboard::from_config(config, transport))
}

#[allow(clippy::too_many_arguments)]
fn run_index(
    config: &DashboardConfig,
    name: &str,
    start: Option<&str>,
    end: Option<&str>,
    with_vix: bool,
    tail: usize,
    as_json: bool,
) -> Result<()> {
    let end_date = parse_date(end, "end")?.unwrap_or_else(|| chrono::Local::now().date_naive());
    let start_date =
        parse_date(start, "start")?.unwrap_or_else(|| end_date - chrono::Duration::days(365));
    if start_date > end_date {
        bail!("--start {start_date} is after --end {end_date}");
    }

    let view = dashboard(config)?.index_view(name, start_date, end_date, with_vix)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&index_json(&view, tail))?);
    } else {
        print_index(&view, config.source, tail);
    }
    Ok(())
}

fn index_json(view: &IndexView, tail: usize) -> serde_json::Value {
    let table = &view.indicators;
    let vix = match &view.vix {
        SecondaryStatus::Available(series) => json!({
            "status": "available",
            "points": &series.points()[series.len().saturating_sub(tail)..],
        }),
        SecondaryStatus::Failed(err) => json!({ "status": "failed", "error": err.to_string() }),
        SecondaryStatus::NotRequested => json!({ "status": "not_requested" }),
        SecondaryStatus::Skipped => json!({ "status": "skipped" }),
        SecondaryStatus::Unavailable => json!({ "status": "unavailable" }),
    };
    json!({
        "symbol": table.symbol(),
        "window": table.window(),
        "rows": table.len(),
        "tail": table.tail(tail),
        "vix": vix,
    })
}

fn print_index(view: &IndexView, source: SourceKind, tail: usize) {
    let table = &view.indicators;
    println!(
        "{} via {} ({} rows, window {})",
        table.symbol(),
        source,
        table.len(),
        table.window()
    );
    if table.is_empty() {
        println!("No trading data in range.");
        return;
    }

    // Aligned points share the index calendar row for row.
    let vix_points = view.vix.series().map(|s| s.points());
    let vix_header = if vix_points.is_some() { "VIX" } else { "" };

    println!();
    println!(
        "  {:<10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>7}",
        "Date", "Close", "MA", "-3σ", "-2σ", "-1σ", "+1σ", "+2σ", "+3σ", vix_header
    );
    let offset = table.len().saturating_sub(tail);
    for (i, row) in table.tail(tail).iter().enumerate() {
        let vix = vix_points
            .and_then(|points| points.get(offset + i))
            .map(|p| format!("{:.2}", p.value))
            .unwrap_or_default();
        println!(
            "  {:<10}  {:>10.2}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>7}",
            row.bar.date.to_string(),
            row.bar.close,
            fmt_opt(row.mean),
            fmt_opt(row.lower(3)),
            fmt_opt(row.lower(2)),
            fmt_opt(row.lower(1)),
            fmt_opt(row.upper(1)),
            fmt_opt(row.upper(2)),
            fmt_opt(row.upper(3)),
            vix,
        );
    }
    if let Some(last) = table.rows().last() {
        print_position(last);
    }

    println!();
    match &view.vix {
        SecondaryStatus::NotRequested => {}
        SecondaryStatus::Skipped => println!("VIX: skipped (no index rows)"),
        SecondaryStatus::Unavailable => println!("VIX: no data in range"),
        SecondaryStatus::Failed(err) => println!("VIX: unavailable ({err})"),
        SecondaryStatus::Available(series) => {
            if let Some(last) = series.points().last() {
                println!(
                    "VIX: {:.2} on {} ({} of {} days filled)",
                    last.value,
                    last.date,
                    series.filled_count(),
                    series.len()
                );
            }
        }
    }
}

/// Where the latest close sits relative to the bands.
fn print_position(row: &IndicatorRow) {
    let (Some(mean), Some(std)) = (row.mean, row.std) else {
        println!("  Bands undefined for the latest row.");
        return;
    };
    if std > 0.0 {
        println!("  Latest close is {:+.2}σ from the mean.", (row.bar.close - mean) / std);
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn run_etfs(config: &DashboardConfig, as_json: bool) -> Result<()> {
    let table = dashboard(config)?.top_etfs(config.etf.top_n)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(table.entries())?);
        return Ok(());
    }

    if table.is_empty() {
        println!("No ETFs left after exclusions.");
        return Ok(());
    }
    println!(
        "  {:>3}  {:<8}  {:<32}  {:>14}  {:>10}  {:>8}",
        "#", "Code", "Name", "Volume", "Price", "Chg%"
    );
    for (i, entry) in table.entries().iter().enumerate() {
        println!(
            "  {:>3}  {:<8}  {:<32}  {:>14}  {:>10.0}  {:>+8.2}",
            i + 1,
            entry.symbol,
            entry.name,
            entry.volume,
            entry.price,
            entry.change_rate
        );
    }
    Ok(())
}

fn run_indices(config: &DashboardConfig) -> Result<()> {
    let symbols = match config.source {
        SourceKind::Yahoo => config.yahoo_symbols(),
        SourceKind::Krx => config.krx_symbols(),
    };
    println!("Indices served by {}:", config.source);
    for (name, ticker) in symbols.iter() {
        println!("  {name:<14} {ticker}");
    }
    Ok(())
}
