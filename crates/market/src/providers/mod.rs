//! The three market data families and the facade that bundles them.
//!
//! Each provider owns one [`ResilientCache`](crate::cache::ResilientCache).
//! Backoff follows the upstream host: price and history share the price
//! API's [`BackoffFetcher`], network stats have their own, so a rate limit on
//! one host never silences the other.

pub mod history;
pub mod network;
pub mod price;

use std::sync::Arc;

use crate::config::MarketConfig;
use crate::fallback::FallbackTable;
use crate::fetcher::BackoffFetcher;
use crate::source::MarketSource;
use crate::types::{HistoryRange, NetworkStats, PricePoint, PriceQuote};

pub use history::HistoryProvider;
pub use network::NetworkProvider;
pub use price::PriceProvider;

/// Best-effort market reads for the dashboard. None of these ever fail.
pub struct MarketData {
    price: PriceProvider,
    history: HistoryProvider,
    network: NetworkProvider,
}

impl MarketData {
    pub fn new(source: Arc<dyn MarketSource>, fallback: FallbackTable, config: &MarketConfig) -> Self {
        let fallback = Arc::new(fallback);
        let fetcher = |provider: &'static str| {
            Arc::new(BackoffFetcher::new(
                provider,
                config.fetch_timeout,
                config.backoff_window,
            ))
        };

        let price_api = fetcher("price_api");

        Self {
            price: PriceProvider::new(
                Arc::clone(&source),
                Arc::clone(&fallback),
                Arc::clone(&price_api),
                config.price_ttl,
            ),
            history: HistoryProvider::new(
                Arc::clone(&source),
                Arc::clone(&fallback),
                price_api,
                config.history_ttl,
            ),
            network: NetworkProvider::new(source, fallback, fetcher("network_api"), config.network_ttl),
        }
    }

    pub async fn get_price(&self, coin: &str, currency: &str) -> Option<PriceQuote> {
        self.price.get(coin, currency).await
    }

    pub async fn get_price_history(
        &self,
        coin: &str,
        currency: &str,
        range: HistoryRange,
    ) -> Vec<PricePoint> {
        self.history.get(coin, currency, range).await
    }

    pub fn get_network_stats(&self, coin: &str) -> Option<NetworkStats> {
        self.network.get(coin)
    }

    pub fn price(&self) -> &PriceProvider {
        &self.price
    }

    pub fn history(&self) -> &HistoryProvider {
        &self.history
    }

    pub fn network(&self) -> &NetworkProvider {
        &self.network
    }
}
