//! Upstream abstraction for the market providers.

use async_trait::async_trait;

use crate::fetcher::FetchError;
use crate::types::{HistoryRange, NetworkStats, PricePoint, PriceQuote};

/// Something that can answer market data requests, typically over HTTP.
///
/// Implementations perform exactly one upstream request per call and must
/// report HTTP 429 as [`FetchError::RateLimited`]; retry and backoff policy
/// belong to the cache layer.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_price(&self, coin: &str, currency: &str) -> Result<PriceQuote, FetchError>;

    async fn fetch_history(
        &self,
        coin: &str,
        currency: &str,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, FetchError>;

    async fn fetch_network_stats(&self, coin: &str) -> Result<NetworkStats, FetchError>;
}
