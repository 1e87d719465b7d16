//! ETF ranking service.

pub mod listing;
pub mod ranking;

pub use listing::{EtfListingSource, NaverEtfListing};
pub use ranking::{rank, top_etfs, EtfFilter, EtfRankingTable, DEFAULT_EXCLUDE_KEYWORDS, DEFAULT_TOP_N};
