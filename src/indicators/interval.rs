//! Bar interval arithmetic for lookback window sizing.

use crate::error::ConfigError;

/// Convert a bar interval string like "15m", "4h", or "1d" to minutes.
///
/// Unit table: m = 1, h = 60, d = 1440. An unrecognized suffix, a
/// non-numeric magnitude, or a zero magnitude is a configuration error.
pub fn interval_to_minutes(interval: &str) -> Result<u32, ConfigError> {
    let bad = || ConfigError::BadInterval(interval.to_string());
    let unit = interval.chars().last().ok_or_else(bad)?;
    let magnitude: u32 = interval[..interval.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| bad())?;
    if magnitude == 0 {
        return Err(bad());
    }
    let multiplier = match unit {
        'm' => 1,
        'h' => 60,
        'd' => 1440,
        _ => return Err(bad()),
    };
    Ok(magnitude * multiplier)
}

/// Number of bars covering `period_minutes` at the given bar interval,
/// rounded to the nearest whole bar.
///
/// A period much shorter than the interval rounds down to 0 bars; lookback
/// computations treat that as "no lookback" rather than an error.
pub fn bars_for_period(interval_minutes: u32, period_minutes: u32) -> usize {
    (period_minutes as f64 / interval_minutes as f64).round() as usize
}
