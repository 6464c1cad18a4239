// Price Fetching Module
// Spot quotes and daily history for a single token from a CoinGecko-compatible API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize)]
pub struct TokenQuote {
    pub token_id: String,
    pub currency: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("price request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("price API returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("no {currency} price for '{token_id}' in response")]
    MissingPrice { token_id: String, currency: String },
    #[error("invalid price {0}")]
    InvalidPrice(f64),
    #[error("price history for '{0}' is empty")]
    EmptyHistory(String),
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    fn token_id(&self) -> &str;

    async fn current_price(&self) -> Result<TokenQuote, PriceError>;

    /// Daily closing prices over the last `days` days, oldest first.
    async fn price_history(&self, days: u32) -> Result<Vec<f64>, PriceError>;
}

// ==================== COINGECKO ====================
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    token_id: String,
    currency: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, token_id: &str, currency: &str) -> Result<Self, PriceError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_id: token_id.to_string(),
            currency: currency.to_lowercase(),
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, PriceError> {
        tracing::debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PriceError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoClient {
    fn token_id(&self) -> &str {
        &self.token_id
    }

    async fn current_price(&self) -> Result<TokenQuote, PriceError> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url, self.token_id, self.currency
        );
        let json = self.get_json(&url).await?;
        let price = parse_simple_price(&json, &self.token_id, &self.currency)?;

        tracing::info!("{} price: {} {}", self.token_id, price, self.currency);
        Ok(TokenQuote {
            token_id: self.token_id.clone(),
            currency: self.currency.clone(),
            price,
            timestamp: Utc::now(),
        })
    }

    async fn price_history(&self, days: u32) -> Result<Vec<f64>, PriceError> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}&interval=daily",
            self.base_url, self.token_id, self.currency, days
        );
        let json = self.get_json(&url).await?;
        let prices = parse_market_chart(&json);
        if prices.is_empty() {
            return Err(PriceError::EmptyHistory(self.token_id.clone()));
        }
        tracing::debug!("Fetched {} history points for {}", prices.len(), self.token_id);
        Ok(prices)
    }
}

// ==================== PARSING ====================

/// Reads `{"<token>": {"<currency>": <price>}}`. The price must be finite and strictly positive.
pub fn parse_simple_price(
    json: &serde_json::Value,
    token_id: &str,
    currency: &str,
) -> Result<f64, PriceError> {
    let price = json
        .get(token_id)
        .and_then(|t| t.get(currency))
        .and_then(|p| p.as_f64())
        .ok_or_else(|| PriceError::MissingPrice {
            token_id: token_id.to_string(),
            currency: currency.to_string(),
        })?;

    if !price.is_finite() || price <= 0.0 {
        return Err(PriceError::InvalidPrice(price));
    }
    Ok(price)
}

/// Reads `{"prices": [[ts_ms, price], ...]}`, sorted by timestamp. Malformed points are skipped.
pub fn parse_market_chart(json: &serde_json::Value) -> Vec<f64> {
    let mut points: Vec<(i64, f64)> = json
        .get("prices")
        .and_then(|p| p.as_array())
        .map(|points| {
            points
                .iter()
                .filter_map(|point| {
                    let pair = point.as_array()?;
                    let ts = pair.first()?.as_f64()? as i64;
                    let price = pair.get(1)?.as_f64()?;
                    price.is_finite().then_some((ts, price))
                })
                .collect()
        })
        .unwrap_or_default();

    points.sort_by_key(|(ts, _)| *ts);
    points.into_iter().map(|(_, price)| price).collect()
}
