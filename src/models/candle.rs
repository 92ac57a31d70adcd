//! OHLCV candle for one fixed-length time bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time bucket of market data, immutable once fetched.
///
/// A candle series is ordered oldest to newest with strictly increasing open
/// times; the source client enforces the ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        open_time: DateTime<Utc>,
        close_time: DateTime<Utc>,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            open_time,
            close_time,
        }
    }
}
