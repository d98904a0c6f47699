//! Periodic market cache warm-up.
//!
//! Reads every configured coin through the three market providers on a fixed
//! interval so dashboard reads are served from a warm cache. The reads go
//! through the same cache, backoff and fallback policy as any other caller.

use std::sync::Arc;

use rigwatch_market::{HistoryRange, MarketData};
use tokio_util::sync::CancellationToken;

use crate::config::WarmupConfig;

/// Outcome of one warm-up pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WarmupReport {
    /// Quotes returned from a live fetch or fresh cache entry.
    pub live_prices: usize,
    /// Quotes that came from the fallback table.
    pub synthetic_prices: usize,
    /// Coins with no quote at all.
    pub missing_prices: usize,
    pub history_points: usize,
    pub network_stats: usize,
}

/// Run one warm-up pass over all configured coins.
pub async fn warm_once(market: &MarketData, warmup: &WarmupConfig) -> WarmupReport {
    let mut report = WarmupReport::default();

    for coin in &warmup.coins {
        match market.get_price(coin, &warmup.currency).await {
            Some(quote) if quote.synthetic => report.synthetic_prices += 1,
            Some(_) => report.live_prices += 1,
            None => report.missing_prices += 1,
        }

        report.history_points += market
            .get_price_history(coin, &warmup.currency, HistoryRange::Day)
            .await
            .len();

        if market.get_network_stats(coin).is_some() {
            report.network_stats += 1;
        }
    }

    report
}

/// Run the warm-up loop until `cancel` is triggered.
pub async fn run(market: Arc<MarketData>, warmup: WarmupConfig, cancel: CancellationToken) {
    tracing::info!(
        coins = ?warmup.coins,
        currency = %warmup.currency,
        interval_secs = warmup.interval.as_secs(),
        "Market warm-up job started"
    );

    let mut interval = tokio::time::interval(warmup.interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Market warm-up job stopping");
                break;
            }
            _ = interval.tick() => {
                let report = warm_once(&market, &warmup).await;
                if report.synthetic_prices > 0 || report.missing_prices > 0 {
                    tracing::warn!(?report, "Market warm-up: upstream degraded");
                } else {
                    tracing::debug!(?report, "Market warm-up: done");
                }
            }
        }
    }
}
