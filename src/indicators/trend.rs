//! Trend measures: simple moving averages.

/// Simple moving average over the last `window` closes.
///
/// Falls back to the latest close when the series is shorter than the
/// window, a "no-trend" default that keeps price-vs-average comparisons
/// well defined.
pub fn sma(closes: &[f64], window: usize) -> f64 {
    let Some(&latest) = closes.last() else {
        return 0.0;
    };
    if window == 0 || closes.len() < window {
        return latest;
    }
    closes[closes.len() - window..].iter().sum::<f64>() / window as f64
}
