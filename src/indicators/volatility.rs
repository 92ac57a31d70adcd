//! Volatility measures: ATR as a percentage of price and close-return
//! standard deviation.

use crate::models::Candle;

/// True range of a bar given the previous close.
fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Average true range over the last `period` bars, expressed as a
/// percentage of the latest close.
///
/// Falls back to 0 when the series cannot cover the period (each true range
/// needs a previous close) or the latest close is zero.
pub fn atr_pct(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 0.0;
    }
    let latest_close = candles[candles.len() - 1].close;
    if latest_close == 0.0 {
        return 0.0;
    }
    let tr_sum: f64 = candles
        .windows(2)
        .rev()
        .take(period)
        .map(|pair| true_range(pair[1].high, pair[1].low, pair[0].close))
        .sum();
    let atr = tr_sum / period as f64;
    atr / latest_close * 100.0
}

/// Sample standard deviation of bar-to-bar fractional close returns over the
/// last `window` returns.
///
/// Falls back to 0 when fewer than `window` returns exist or the window is
/// too small for a sample deviation. A zero previous close yields no
/// measurable return and contributes 0.
pub fn return_stddev(closes: &[f64], window: usize) -> f64 {
    if window < 2 || closes.len() < window + 1 {
        return 0.0;
    }
    let returns: Vec<f64> = closes[closes.len() - window - 1..]
        .windows(2)
        .map(|pair| {
            if pair[0] == 0.0 {
                0.0
            } else {
                (pair[1] - pair[0]) / pair[0]
            }
        })
        .collect();
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns
        .iter()
        .map(|r| (r - mean) * (r - mean))
        .sum::<f64>()
        / (returns.len() - 1) as f64;
    variance.sqrt()
}
