use std::time::Duration;

use crate::fetcher::{DEFAULT_BACKOFF_WINDOW, DEFAULT_FETCH_TIMEOUT};

/// Market data configuration loaded from environment variables.
///
/// All fields have defaults suitable for the public upstream APIs.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Base URL of the price and price-history API.
    pub price_api_url: String,
    /// Base URL of the mining-network statistics API.
    pub network_api_url: String,
    /// How long a caller waits on one foreground request.
    pub fetch_timeout: Duration,
    /// Hard limit on any single HTTP request, including abandoned ones.
    pub request_timeout: Duration,
    /// Provider-wide quiet period after an HTTP 429.
    pub backoff_window: Duration,
    pub price_ttl: Duration,
    pub history_ttl: Duration,
    pub network_ttl: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            price_api_url: "https://api.coingecko.com/api/v3".into(),
            network_api_url: "https://mempool.space/api/v1".into(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            request_timeout: Duration::from_secs(30),
            backoff_window: DEFAULT_BACKOFF_WINDOW,
            price_ttl: Duration::from_secs(60),
            history_ttl: Duration::from_secs(15 * 60),
            network_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl MarketConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                            |
    /// |-------------------------------|------------------------------------|
    /// | `PRICE_API_URL`               | `https://api.coingecko.com/api/v3` |
    /// | `NETWORK_API_URL`             | `https://mempool.space/api/v1`     |
    /// | `MARKET_FETCH_TIMEOUT_SECS`   | `8`                                |
    /// | `MARKET_REQUEST_TIMEOUT_SECS` | `30`                               |
    /// | `MARKET_BACKOFF_SECS`         | `60`                               |
    /// | `PRICE_TTL_SECS`              | `60`                               |
    /// | `HISTORY_TTL_SECS`            | `900`                              |
    /// | `NETWORK_TTL_SECS`            | `1800`                             |
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            price_api_url: env_string("PRICE_API_URL", defaults.price_api_url),
            network_api_url: env_string("NETWORK_API_URL", defaults.network_api_url),
            fetch_timeout: env_secs("MARKET_FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            request_timeout: env_secs("MARKET_REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            backoff_window: env_secs("MARKET_BACKOFF_SECS", defaults.backoff_window),
            price_ttl: env_secs("PRICE_TTL_SECS", defaults.price_ttl),
            history_ttl: env_secs("HISTORY_TTL_SECS", defaults.history_ttl),
            network_ttl: env_secs("NETWORK_TTL_SECS", defaults.network_ttl),
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "Invalid duration, using default");
                default
            }
        },
        Err(_) => default,
    }
}
