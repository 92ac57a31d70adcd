//! Shared helpers for building candle fixtures.

use chrono::{Duration, TimeZone, Utc};
use perpguard::models::Candle;

/// Build candles at a 15m spacing from a list of closes. High/low straddle
/// the close by half a point so true ranges are well defined.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open_time = start + Duration::minutes(15 * i as i64);
            Candle::new(
                close,
                close + 0.5,
                close - 0.5,
                close,
                1_000.0,
                open_time,
                open_time + Duration::minutes(15),
            )
        })
        .collect()
}

/// A steadily rising series starting at `start` with `step` per bar.
pub fn uptrend_closes(count: usize, start: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| start + i as f64 * step).collect()
}

pub fn flat_candles(count: usize, price: f64) -> Vec<Candle> {
    candles_from_closes(&vec![price; count])
}
