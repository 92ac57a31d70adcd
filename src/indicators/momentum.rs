//! Momentum measures: lookback percent change and RSI.

/// Fractional change between the latest close and the close `bars` bars
/// earlier.
///
/// Returns 0 when the series has fewer than `bars + 1` points or the base
/// value is exactly zero, so a thin history can never produce an undefined
/// or infinite lookback.
pub fn percent_change(closes: &[f64], bars: usize) -> f64 {
    if bars == 0 || closes.len() <= bars {
        return 0.0;
    }
    let latest = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - bars];
    if base == 0.0 {
        return 0.0;
    }
    (latest - base) / base
}

/// RSI over the classic average-gain/average-loss ratio.
///
/// RSI = 100 - 100 / (1 + RS), RS = average gain / average loss over the
/// last `period` bar-to-bar changes. Falls back to the neutral midpoint 50
/// when the series is shorter than `period + 1` points or the average loss
/// is zero (the ratio is undefined there).
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 50.0;
    }
    let mut gains = 0.0;
    let mut losses = 0.0;
    for window in closes[closes.len() - period - 1..].windows(2) {
        let delta = window[1] - window[0];
        if delta > 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }
    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return 50.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
