//! Synthetic fallback data.
//!
//! The table is plain configuration data, loaded from JSON at startup, so
//! placeholder values can be updated without a rebuild. Coin and currency
//! keys are matched case-insensitively.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{HistoryRange, NetworkStats, PricePoint, PriceQuote};

/// Errors from loading a fallback table.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("Failed to read fallback table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fallback table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Network figures used when no upstream answer is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkFallback {
    pub difficulty: f64,
    pub hashrate: f64,
}

/// Per-entity placeholder values.
///
/// ```json
/// {
///   "prices":  { "bitcoin": { "usd": 65000.0, "eur": 60000.0 } },
///   "network": { "bitcoin": { "difficulty": 8.8e13, "hashrate": 6.5e20 } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackTable {
    /// coin -> currency -> price.
    #[serde(default)]
    pub prices: HashMap<String, HashMap<String, f64>>,
    /// coin -> network figures.
    #[serde(default)]
    pub network: HashMap<String, NetworkFallback>,
}

impl FallbackTable {
    pub fn from_json(json: &str) -> Result<Self, FallbackError> {
        let table: FallbackTable = serde_json::from_str(json)?;
        Ok(table.normalized())
    }

    /// Read and parse a table from disk.
    pub async fn load(path: &Path) -> Result<Self, FallbackError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Lowercase every key so lookups are case-insensitive.
    fn normalized(self) -> Self {
        let prices = self
            .prices
            .into_iter()
            .map(|(coin, by_currency)| {
                let by_currency = by_currency
                    .into_iter()
                    .map(|(currency, price)| (currency.to_ascii_lowercase(), price))
                    .collect();
                (coin.to_ascii_lowercase(), by_currency)
            })
            .collect();
        let network = self
            .network
            .into_iter()
            .map(|(coin, stats)| (coin.to_ascii_lowercase(), stats))
            .collect();
        Self { prices, network }
    }

    pub fn price(&self, coin: &str, currency: &str) -> Option<f64> {
        self.prices
            .get(&coin.to_ascii_lowercase())?
            .get(&currency.to_ascii_lowercase())
            .copied()
    }

    pub fn price_quote(&self, coin: &str, currency: &str) -> Option<PriceQuote> {
        let price = self.price(coin, currency)?;
        Some(PriceQuote {
            coin: coin.to_ascii_lowercase(),
            currency: currency.to_ascii_lowercase(),
            price,
            change_24h: None,
            synthetic: true,
        })
    }

    /// A flat series at the fallback price covering `range`, ending at `now`.
    ///
    /// Hourly samples for ranges up to a week, daily samples beyond that.
    pub fn price_history(
        &self,
        coin: &str,
        currency: &str,
        range: HistoryRange,
        now: DateTime<Utc>,
    ) -> Option<Vec<PricePoint>> {
        let price = self.price(coin, currency)?;
        let (step, samples) = if range.days() <= 7 {
            (ChronoDuration::hours(1), range.days() * 24)
        } else {
            (ChronoDuration::days(1), range.days())
        };
        let points = (0..=samples)
            .rev()
            .map(|i| PricePoint {
                timestamp: now - step * i as i32,
                price,
            })
            .collect();
        Some(points)
    }

    pub fn network_stats(&self, coin: &str) -> Option<NetworkStats> {
        let stats = self.network.get(&coin.to_ascii_lowercase())?;
        Some(NetworkStats {
            coin: coin.to_ascii_lowercase(),
            difficulty: stats.difficulty,
            hashrate: stats.hashrate,
            synthetic: true,
        })
    }
}
