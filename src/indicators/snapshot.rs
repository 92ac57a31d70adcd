//! Snapshot assembly: one pass over a candle series into fixed-shape
//! scalars.

use crate::error::ConfigError;
use crate::indicators::{interval, momentum, trend, volatility};
use crate::models::{Candle, MarketSnapshot};

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const SMA_FAST_WINDOW: usize = 20;
pub const SMA_SLOW_WINDOW: usize = 60;

/// Compute summary statistics and indicators from candlestick data.
///
/// The only failure mode is an unusable interval string; indicator values
/// themselves always resolve through their documented fallbacks.
pub fn build_snapshot(
    symbol: &str,
    interval_str: &str,
    candles: &[Candle],
) -> Result<MarketSnapshot, ConfigError> {
    let interval_minutes = interval::interval_to_minutes(interval_str)?;
    let bars_24h = interval::bars_for_period(interval_minutes, 24 * 60);
    let bars_4h = interval::bars_for_period(interval_minutes, 4 * 60);
    let bars_1h = interval::bars_for_period(interval_minutes, 60).max(1);

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let latest_close = closes.last().copied().unwrap_or(0.0);

    Ok(MarketSnapshot {
        symbol: symbol.to_string(),
        interval: interval_str.to_string(),
        latest_close,
        change_24h: momentum::percent_change(&closes, bars_24h),
        change_4h: momentum::percent_change(&closes, bars_4h),
        momentum_1h: momentum::percent_change(&closes, bars_1h),
        rsi: momentum::rsi(&closes, RSI_PERIOD),
        sma_fast: trend::sma(&closes, SMA_FAST_WINDOW),
        sma_slow: trend::sma(&closes, SMA_SLOW_WINDOW),
        atr_pct: volatility::atr_pct(candles, ATR_PERIOD),
        volume_24h: candles.iter().rev().take(bars_24h).map(|c| c.volume).sum(),
        volatility_24h: volatility::return_stddev(&closes, bars_24h),
    })
}
