use std::path::PathBuf;
use std::time::Duration;

use rigwatch_market::MarketConfig;

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// JSON document holding the persisted alert config.
    pub settings_path: PathBuf,
    /// JSON fallback table served when market upstreams are unavailable.
    pub fallback_table_path: PathBuf,
    pub warmup: WarmupConfig,
    pub market: MarketConfig,
}

/// What the market warm-up job reads, and how often.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmupConfig {
    pub coins: Vec<String>,
    pub currency: String,
    pub interval: Duration,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            coins: vec!["bitcoin".into()],
            currency: "usd".into(),
            interval: Duration::from_secs(60),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                |
    /// |------------------------|------------------------|
    /// | `SETTINGS_PATH`        | `data/settings.json`   |
    /// | `FALLBACK_TABLE_PATH`  | `config/fallback.json` |
    /// | `WARMUP_COINS`         | `bitcoin`              |
    /// | `WARMUP_CURRENCY`      | `usd`                  |
    /// | `WARMUP_INTERVAL_SECS` | `60`                   |
    ///
    /// Market settings are read by [`MarketConfig::from_env`].
    pub fn from_env() -> Self {
        let warmup_defaults = WarmupConfig::default();

        let settings_path = std::env::var("SETTINGS_PATH")
            .unwrap_or_else(|_| "data/settings.json".into())
            .into();
        let fallback_table_path = std::env::var("FALLBACK_TABLE_PATH")
            .unwrap_or_else(|_| "config/fallback.json".into())
            .into();

        let coins = std::env::var("WARMUP_COINS")
            .ok()
            .map(|raw| parse_list(&raw))
            .filter(|coins| !coins.is_empty())
            .unwrap_or(warmup_defaults.coins);
        let currency = std::env::var("WARMUP_CURRENCY")
            .ok()
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or(warmup_defaults.currency);
        let interval = std::env::var("WARMUP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(warmup_defaults.interval);

        Self {
            settings_path,
            fallback_table_path,
            warmup: WarmupConfig {
                coins,
                currency,
                interval,
            },
            market: MarketConfig::from_env(),
        }
    }
}

/// Split a comma-separated list, dropping blanks and lowercasing ids.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_lowercases() {
        assert_eq!(
            parse_list(" Bitcoin, ,litecoin ,"),
            vec!["bitcoin".to_string(), "litecoin".to_string()]
        );
    }

    #[test]
    fn parse_list_of_blanks_is_empty() {
        assert!(parse_list(" , ,").is_empty());
    }

    #[test]
    fn warmup_defaults() {
        let w = WarmupConfig::default();
        assert_eq!(w.coins, vec!["bitcoin".to_string()]);
        assert_eq!(w.currency, "usd");
        assert_eq!(w.interval, Duration::from_secs(60));
    }
}
