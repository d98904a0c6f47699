//! HTTP [`MarketSource`] over public market APIs.
//!
//! Prices and price history come from a CoinGecko-compatible API; network
//! difficulty and hashrate come from a mempool.space-compatible API, which
//! only covers bitcoin.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::MarketConfig;
use crate::fetcher::FetchError;
use crate::source::MarketSource;
use crate::types::{HistoryRange, NetworkStats, PricePoint, PriceQuote};

/// Coins the network statistics API can answer for.
const NETWORK_STATS_COINS: &[&str] = &["bitcoin"];

/// HTTP client for the upstream market APIs.
pub struct HttpMarketSource {
    client: reqwest::Client,
    price_api_url: String,
    network_api_url: String,
}

/// Body of `GET /coins/{id}/market_chart`.
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// `[unix_millis, price]` pairs.
    prices: Vec<(f64, f64)>,
}

/// Body of `GET /mining/hashrate/3d`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HashrateResponse {
    current_hashrate: f64,
    current_difficulty: f64,
}

impl HttpMarketSource {
    /// Build a source with its own client, capped at `config.request_timeout`
    /// per request.
    pub fn new(config: &MarketConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("rigwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(
            client,
            config.price_api_url.clone(),
            config.network_api_url.clone(),
        ))
    }

    /// Create a source reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, price_api_url: String, network_api_url: String) -> Self {
        Self {
            client,
            price_api_url,
            network_api_url,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let response = self.client.get(&url).query(query).send().await?;
        check_status(response.status())?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MarketSource for HttpMarketSource {
    async fn fetch_price(&self, coin: &str, currency: &str) -> Result<PriceQuote, FetchError> {
        let body: serde_json::Value = self
            .get_json(
                format!("{}/simple/price", self.price_api_url),
                &[
                    ("ids", coin),
                    ("vs_currencies", currency),
                    ("include_24hr_change", "true"),
                ],
            )
            .await?;
        parse_simple_price(&body, coin, currency)
    }

    async fn fetch_history(
        &self,
        coin: &str,
        currency: &str,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let coin = path_id(coin)?;
        let days = range.days().to_string();
        let body: MarketChartResponse = self
            .get_json(
                format!("{}/coins/{}/market_chart", self.price_api_url, coin),
                &[("vs_currency", currency), ("days", &days)],
            )
            .await?;
        market_chart_points(body)
    }

    async fn fetch_network_stats(&self, coin: &str) -> Result<NetworkStats, FetchError> {
        if !NETWORK_STATS_COINS.contains(&coin) {
            return Err(FetchError::Unsupported(coin.to_string()));
        }
        let body: HashrateResponse = self
            .get_json(format!("{}/mining/hashrate/3d", self.network_api_url), &[])
            .await?;
        Ok(NetworkStats {
            coin: coin.to_string(),
            difficulty: body.current_difficulty,
            hashrate: body.current_hashrate,
            synthetic: false,
        })
    }
}

// ---- private helpers ----

/// Accept an entity id for use as a URL path segment.
///
/// Upstream ids are lowercase ASCII letters, digits and dashes; anything else
/// is refused before a request is built.
fn path_id(id: &str) -> Result<&str, FetchError> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(id)
    } else {
        Err(FetchError::Unsupported(format!("invalid entity id {id:?}")))
    }
}

/// Map an HTTP status to the fetch error taxonomy.
fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(())
}

/// Parse `{"bitcoin": {"usd": 65000.0, "usd_24h_change": -1.2}}`.
fn parse_simple_price(
    body: &serde_json::Value,
    coin: &str,
    currency: &str,
) -> Result<PriceQuote, FetchError> {
    let entry = body
        .get(coin)
        .ok_or_else(|| FetchError::Decode(format!("no price entry for {coin}")))?;
    let price = entry
        .get(currency)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| FetchError::Decode(format!("no {currency} price for {coin}")))?;
    let change_24h = entry
        .get(format!("{currency}_24h_change"))
        .and_then(serde_json::Value::as_f64);

    Ok(PriceQuote {
        coin: coin.to_string(),
        currency: currency.to_string(),
        price,
        change_24h,
        synthetic: false,
    })
}

fn market_chart_points(body: MarketChartResponse) -> Result<Vec<PricePoint>, FetchError> {
    body.prices
        .into_iter()
        .map(|(millis, price)| {
            DateTime::<Utc>::from_timestamp_millis(millis as i64)
                .map(|timestamp| PricePoint { timestamp, price })
                .ok_or_else(|| FetchError::Decode(format!("invalid timestamp {millis}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn too_many_requests_is_rate_limited() {
        assert_matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(FetchError::RateLimited)
        );
        assert_matches!(
            check_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(FetchError::Status(503))
        );
        assert!(check_status(StatusCode::OK).is_ok());
    }

    #[test]
    fn parses_simple_price_with_change() {
        let body = serde_json::json!({"bitcoin": {"usd": 65000.5, "usd_24h_change": -1.25}});
        let q = parse_simple_price(&body, "bitcoin", "usd").unwrap();
        assert_eq!(q.price, 65000.5);
        assert_eq!(q.change_24h, Some(-1.25));
        assert!(!q.synthetic);
    }

    #[test]
    fn simple_price_without_change_is_ok() {
        let body = serde_json::json!({"litecoin": {"eur": 70.0}});
        let q = parse_simple_price(&body, "litecoin", "eur").unwrap();
        assert_eq!(q.change_24h, None);
    }

    #[test]
    fn simple_price_missing_coin_is_decode_error() {
        let body = serde_json::json!({});
        assert_matches!(
            parse_simple_price(&body, "bitcoin", "usd"),
            Err(FetchError::Decode(_))
        );
        let body = serde_json::json!({"bitcoin": {"usd": "n/a"}});
        assert_matches!(
            parse_simple_price(&body, "bitcoin", "usd"),
            Err(FetchError::Decode(_))
        );
    }

    #[test]
    fn market_chart_converts_millis() {
        let body: MarketChartResponse =
            serde_json::from_str(r#"{"prices": [[1700000000000, 37000.0], [1700003600000, 37100.5]]}"#)
                .unwrap();
        let points = market_chart_points(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp.timestamp(), 1_700_000_000);
        assert_eq!(points[1].price, 37100.5);
    }

    #[test]
    fn hashrate_response_uses_camel_case() {
        let body: HashrateResponse = serde_json::from_str(
            r#"{"hashrates": [], "difficulty": [], "currentHashrate": 6.1e20, "currentDifficulty": 8.3e13}"#,
        )
        .unwrap();
        assert_eq!(body.current_difficulty, 8.3e13);
    }

    #[tokio::test]
    async fn network_stats_rejects_unsupported_coin() {
        let source = HttpMarketSource::new(&MarketConfig::default()).unwrap();
        assert_matches!(
            source.fetch_network_stats("dogecoin").await,
            Err(FetchError::Unsupported(_))
        );
    }

    #[test]
    fn path_id_accepts_only_plain_ids() {
        assert_eq!(path_id("bitcoin-cash").unwrap(), "bitcoin-cash");
        assert_eq!(path_id("0x0").unwrap(), "0x0");
        for bad in ["", "../admin", "btc/usd", "bit coin", "BTC", "btc?x=1", "btc%2f"] {
            assert_matches!(path_id(bad), Err(FetchError::Unsupported(_)), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn history_refuses_path_injection_without_a_request() {
        let source = HttpMarketSource::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9".into(),
            "http://127.0.0.1:9".into(),
        );
        assert_matches!(
            source.fetch_history("../../admin", "usd", HistoryRange::Day).await,
            Err(FetchError::Unsupported(_))
        );
    }
}
