//! Domain tables passed between the core components.

pub mod bar;
pub mod etf;
pub mod series;

pub use bar::{OhlcvBar, OhlcvTable, OHLCV_COLUMNS};
pub use etf::EtfEntry;
pub use series::{SecondarySeries, SeriesPoint};
