//! Mining-network difficulty and hashrate.
//!
//! Served stale-while-revalidate: dashboards ask for these on first paint,
//! so callers never wait on the upstream, not even on a cold cache.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResilientCache;
use crate::fallback::FallbackTable;
use crate::fetcher::BackoffFetcher;
use crate::source::MarketSource;
use crate::types::NetworkStats;

pub struct NetworkProvider {
    cache: ResilientCache<NetworkStats>,
    source: Arc<dyn MarketSource>,
    fallback: Arc<FallbackTable>,
    ttl: Duration,
}

impl NetworkProvider {
    pub fn new(
        source: Arc<dyn MarketSource>,
        fallback: Arc<FallbackTable>,
        fetcher: Arc<BackoffFetcher>,
        ttl: Duration,
    ) -> Self {
        Self {
            cache: ResilientCache::new(fetcher),
            source,
            fallback,
            ttl,
        }
    }

    pub fn cache_key(coin: &str) -> String {
        format!("network:{coin}")
    }

    /// Cached or synthetic stats, returned without waiting on the network.
    pub fn get(&self, coin: &str) -> Option<NetworkStats> {
        let coin = coin.to_ascii_lowercase();
        let key = Self::cache_key(&coin);

        let source = Arc::clone(&self.source);
        let req_coin = coin.clone();
        let fetch = move || async move { source.fetch_network_stats(&req_coin).await };

        self.cache
            .get_or_refresh(&key, self.ttl, fetch, || self.fallback.network_stats(&coin))
    }

    pub fn cache(&self) -> &ResilientCache<NetworkStats> {
        &self.cache
    }
}
