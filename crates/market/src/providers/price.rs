//! Live price quotes.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResilientCache;
use crate::fallback::FallbackTable;
use crate::fetcher::BackoffFetcher;
use crate::source::MarketSource;
use crate::types::PriceQuote;

pub struct PriceProvider {
    cache: ResilientCache<PriceQuote>,
    source: Arc<dyn MarketSource>,
    fallback: Arc<FallbackTable>,
    ttl: Duration,
}

impl PriceProvider {
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

    pub fn cache_key(coin: &str, currency: &str) -> String {
        format!("price:{coin}:{currency}")
    }

    /// Best-effort quote: fresh, stale, or synthetic, in that order of preference.
    pub async fn get(&self, coin: &str, currency: &str) -> Option<PriceQuote> {
        let coin = coin.to_ascii_lowercase();
        let currency = currency.to_ascii_lowercase();
        let key = Self::cache_key(&coin, &currency);

        let source = Arc::clone(&self.source);
        let (req_coin, req_currency) = (coin.clone(), currency.clone());
        let fetch = move || async move { source.fetch_price(&req_coin, &req_currency).await };

        self.cache
            .get(&key, self.ttl, fetch, || {
                self.fallback.price_quote(&coin, &currency)
            })
            .await
    }

    pub fn cache(&self) -> &ResilientCache<PriceQuote> {
        &self.cache
    }
}
