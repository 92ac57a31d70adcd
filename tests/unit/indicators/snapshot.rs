//! Unit tests for snapshot assembly

use crate::test_utils::{candles_from_closes, uptrend_closes};
use perpguard::error::ConfigError;
use perpguard::indicators::build_snapshot;

#[test]
fn thin_series_resolves_every_field_through_fallbacks() {
    let candles = candles_from_closes(&[100.0, 101.0]);
    let snapshot = build_snapshot("BTCUSDT", "15m", &candles).unwrap();

    assert_eq!(snapshot.symbol, "BTCUSDT");
    assert_eq!(snapshot.interval, "15m");
    assert_eq!(snapshot.latest_close, 101.0);
    assert_eq!(snapshot.rsi, 50.0);
    assert_eq!(snapshot.sma_fast, 101.0);
    assert_eq!(snapshot.sma_slow, 101.0);
    assert_eq!(snapshot.atr_pct, 0.0);
    assert_eq!(snapshot.volatility_24h, 0.0);
    assert_eq!(snapshot.change_24h, 0.0);
    assert_eq!(snapshot.change_4h, 0.0);
    assert_eq!(snapshot.momentum_1h, 0.0);
    assert_eq!(snapshot.volume_24h, 2_000.0);
}

#[test]
fn hourly_momentum_window_never_drops_below_one_bar() {
    // At a 1d interval the 1h window rounds to zero bars; the floor of one
    // bar keeps the momentum lookback live
    let candles = candles_from_closes(&[100.0, 101.0]);
    let snapshot = build_snapshot("BTCUSDT", "1d", &candles).unwrap();
    assert!((snapshot.momentum_1h - 0.01).abs() < 1e-9);
    // while the 4h window stays at zero bars and falls back to 0
    assert_eq!(snapshot.change_4h, 0.0);
}

#[test]
fn full_series_produces_finite_indicators() {
    let candles = candles_from_closes(&uptrend_closes(200, 100.0, 0.1));
    let snapshot = build_snapshot("BTCUSDT", "15m", &candles).unwrap();

    for value in [
        snapshot.latest_close,
        snapshot.change_24h,
        snapshot.change_4h,
        snapshot.momentum_1h,
        snapshot.rsi,
        snapshot.sma_fast,
        snapshot.sma_slow,
        snapshot.atr_pct,
        snapshot.volume_24h,
        snapshot.volatility_24h,
    ] {
        assert!(value.is_finite());
    }
    // 96 bars of 15m cover 24h; the uptrend change must be positive
    assert!(snapshot.change_24h > 0.0);
    assert!(snapshot.sma_fast > snapshot.sma_slow);
    // 24h volume covers the last 96 bars
    assert_eq!(snapshot.volume_24h, 96_000.0);
}

#[test]
fn volume_sums_whole_series_when_shorter_than_a_day() {
    let candles = candles_from_closes(&uptrend_closes(10, 100.0, 0.1));
    let snapshot = build_snapshot("BTCUSDT", "15m", &candles).unwrap();
    assert_eq!(snapshot.volume_24h, 10_000.0);
}

#[test]
fn unknown_interval_unit_is_a_configuration_error() {
    let candles = candles_from_closes(&[100.0]);
    assert!(matches!(
        build_snapshot("BTCUSDT", "15q", &candles),
        Err(ConfigError::BadInterval(_))
    ));
}
