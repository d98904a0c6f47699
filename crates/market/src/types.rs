//! Market data values served to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current price of one coin in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub coin: String,
    pub currency: String,
    pub price: f64,
    /// Percentage change over the last 24 hours, when the upstream reports it.
    pub change_24h: Option<f64>,
    /// `true` when the value comes from the fallback table, not the upstream.
    #[serde(default)]
    pub synthetic: bool,
}

/// One sample of a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Mining-network statistics for a coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub coin: String,
    pub difficulty: f64,
    /// Estimated network hashrate in H/s.
    pub hashrate: f64,
    #[serde(default)]
    pub synthetic: bool,
}

/// Window of a price history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRange {
    Day,
    Week,
    Month,
    Year,
}

impl HistoryRange {
    pub fn days(self) -> u32 {
        match self {
            HistoryRange::Day => 1,
            HistoryRange::Week => 7,
            HistoryRange::Month => 30,
            HistoryRange::Year => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HistoryRange::Day => "day",
            HistoryRange::Week => "week",
            HistoryRange::Month => "month",
            HistoryRange::Year => "year",
        }
    }
}

impl std::str::FromStr for HistoryRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "1d" => Ok(HistoryRange::Day),
            "week" | "7d" => Ok(HistoryRange::Week),
            "month" | "30d" => Ok(HistoryRange::Month),
            "year" | "365d" => Ok(HistoryRange::Year),
            other => Err(format!("unknown history range: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parses_aliases() {
        assert_eq!("week".parse::<HistoryRange>(), Ok(HistoryRange::Week));
        assert_eq!(" 30D ".parse::<HistoryRange>(), Ok(HistoryRange::Month));
        assert!("fortnight".parse::<HistoryRange>().is_err());
    }

    #[test]
    fn quote_without_synthetic_flag_deserializes() {
        let q: PriceQuote = serde_json::from_str(
            r#"{"coin":"bitcoin","currency":"usd","price":1.0,"change_24h":null}"#,
        )
        .unwrap();
        assert!(!q.synthetic);
    }
}
