//! Price history series.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::ResilientCache;
use crate::fallback::FallbackTable;
use crate::fetcher::BackoffFetcher;
use crate::source::MarketSource;
use crate::types::{HistoryRange, PricePoint};

pub struct HistoryProvider {
    cache: ResilientCache<Vec<PricePoint>>,
    source: Arc<dyn MarketSource>,
    fallback: Arc<FallbackTable>,
    ttl: Duration,
}

impl HistoryProvider {
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

    pub fn cache_key(coin: &str, currency: &str, range: HistoryRange) -> String {
        format!("history:{coin}:{currency}:{}", range.as_str())
    }

    /// Best-effort series. Empty when neither upstream, cache nor fallback
    /// has anything for the pair.
    pub async fn get(&self, coin: &str, currency: &str, range: HistoryRange) -> Vec<PricePoint> {
        let coin = coin.to_ascii_lowercase();
        let currency = currency.to_ascii_lowercase();
        let key = Self::cache_key(&coin, &currency, range);

        let source = Arc::clone(&self.source);
        let (req_coin, req_currency) = (coin.clone(), currency.clone());
        let fetch =
            move || async move { source.fetch_history(&req_coin, &req_currency, range).await };

        self.cache
            .get(&key, self.ttl, fetch, || {
                self.fallback
                    .price_history(&coin, &currency, range, Utc::now())
            })
            .await
            .unwrap_or_default()
    }

    pub fn cache(&self) -> &ResilientCache<Vec<PricePoint>> {
        &self.cache
    }
}
