//! Provider adapters, transport and calendar alignment.

pub mod align;
pub mod cache;
pub mod circuit_breaker;
pub mod http;
pub mod krx;
pub mod provider;
pub mod schema;
pub mod symbols;
pub mod yahoo;

pub use align::{align, AlignedPoint, AlignedSeries, Fill};
pub use cache::{CacheKey, CachedProvider};
pub use circuit_breaker::CircuitBreaker;
pub use http::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use krx::KrxProvider;
pub use provider::{build_provider, default_transport, MarketDataProvider, SourceKind};
pub use schema::TableSchema;
pub use symbols::SymbolMap;
pub use yahoo::YahooProvider;
