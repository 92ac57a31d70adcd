//! Fixed-shape indicator snapshot derived from one candle series.

use serde::{Deserialize, Serialize};

/// Summary statistics and indicators at one point in time.
///
/// Every field is a finite real number: indicator computations that lack
/// enough history substitute their documented fallback instead of producing
/// NaN or infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub interval: String,
    pub latest_close: f64,
    /// Fractional change over the last 24 hours (0.01 = +1%).
    pub change_24h: f64,
    pub change_4h: f64,
    pub momentum_1h: f64,
    pub rsi: f64,
    /// SMA over the fast (20-bar) window.
    pub sma_fast: f64,
    /// SMA over the slow (60-bar) window.
    pub sma_slow: f64,
    /// Average true range as a percentage of the latest close.
    pub atr_pct: f64,
    pub volume_24h: f64,
    /// Sample standard deviation of bar-to-bar close returns over 24 hours.
    pub volatility_24h: f64,
}
