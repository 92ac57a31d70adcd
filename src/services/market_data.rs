//! Candle retrieval from the Binance klines REST API.
//!
//! Execution happens on the futures venue, but Binance spot klines back the
//! market context for reliability and speed.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::DateTime;
use serde_json::Value;
use thiserror::Error;

use crate::models::Candle;

pub const BINANCE_KLINES_URL: &str = "https://api.binance.com/api/v3/klines";

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("kline request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no kline data returned for {0}")]
    Empty(String),
    #[error("malformed kline payload: {0}")]
    Malformed(String),
}

/// Retrieval of raw candle data for one symbol and interval.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch up to `limit` candles ordered oldest to newest, strictly
    /// increasing open time.
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

pub struct BinanceCandleSource {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceCandleSource {
    pub fn new() -> Self {
        Self::with_client(BINANCE_KLINES_URL, reqwest::Client::new())
    }

    /// Build against a custom endpoint, used by tests to point at a mock
    /// server.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch_once(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(MarketDataError::Empty(symbol.to_string()));
        }

        let mut candles = rows
            .iter()
            .map(parse_kline)
            .collect::<Result<Vec<Candle>, MarketDataError>>()?;
        candles.sort_by_key(|c| c.open_time);
        for pair in candles.windows(2) {
            if pair[1].open_time <= pair[0].open_time {
                return Err(MarketDataError::Malformed(format!(
                    "duplicate kline open time {}",
                    pair[1].open_time
                )));
            }
        }
        Ok(candles)
    }
}

impl Default for BinanceCandleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandleSource for BinanceCandleSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        // Retry transport errors only; malformed and empty payloads are
        // terminal.
        (|| self.fetch_once(symbol, interval, limit))
            .retry(ExponentialBuilder::default().with_max_times(2))
            .when(|error: &MarketDataError| matches!(error, MarketDataError::Request(_)))
            .await
    }
}

/// Decode one kline row.
///
/// Binance encodes each kline as a positional array with string-encoded
/// prices: [open_time, open, high, low, close, volume, close_time, ...].
fn parse_kline(row: &Value) -> Result<Candle, MarketDataError> {
    let fields = row
        .as_array()
        .ok_or_else(|| MarketDataError::Malformed("kline row is not an array".to_string()))?;
    if fields.len() < 7 {
        return Err(MarketDataError::Malformed(format!(
            "kline row has {} fields, expected at least 7",
            fields.len()
        )));
    }

    let open_time = timestamp_field(&fields[0], "open_time")?;
    let close_time = timestamp_field(&fields[6], "close_time")?;
    Ok(Candle::new(
        decimal_field(&fields[1], "open")?,
        decimal_field(&fields[2], "high")?,
        decimal_field(&fields[3], "low")?,
        decimal_field(&fields[4], "close")?,
        decimal_field(&fields[5], "volume")?,
        open_time,
        close_time,
    ))
}

fn timestamp_field(
    value: &Value,
    name: &str,
) -> Result<chrono::DateTime<chrono::Utc>, MarketDataError> {
    let millis = value
        .as_i64()
        .ok_or_else(|| MarketDataError::Malformed(format!("non-integer {name}: {value}")))?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| MarketDataError::Malformed(format!("{name} out of range: {millis}")))
}

fn decimal_field(value: &Value, name: &str) -> Result<f64, MarketDataError> {
    let raw = value
        .as_str()
        .ok_or_else(|| MarketDataError::Malformed(format!("non-string {name}: {value}")))?;
    raw.parse()
        .map_err(|_| MarketDataError::Malformed(format!("non-numeric {name}: '{raw}'")))
}
