//! Resilient access to volatile external market data.
//!
//! Price quotes, price history and mining-network statistics are served
//! through a [`cache::ResilientCache`] that prefers stale or synthetic data
//! over blocking or failing:
//!
//! - [`fetcher`]: bounds each upstream request and opens a provider-wide
//!   backoff window on HTTP 429.
//! - [`cache`]: per-key TTL cache with stale and fallback serving, plus a
//!   stale-while-revalidate variant.
//! - [`fallback`]: synthetic data table loaded from configuration.
//! - [`http`]: the [`source::MarketSource`] implementation over HTTP.
//! - [`providers`]: the three cache parameterisations and the
//!   [`MarketData`] facade handed to callers.

pub mod cache;
pub mod config;
pub mod fallback;
pub mod fetcher;
pub mod http;
pub mod providers;
pub mod source;
pub mod types;

pub use config::MarketConfig;
pub use fallback::FallbackTable;
pub use fetcher::FetchError;
pub use http::HttpMarketSource;
pub use providers::MarketData;
pub use source::MarketSource;
pub use types::{HistoryRange, NetworkStats, PricePoint, PriceQuote};
