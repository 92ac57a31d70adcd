//! Unit tests for the simple moving average

use perpguard::indicators::trend::sma;

#[test]
fn sma_over_full_window() {
    let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
    assert!((sma(&closes, 5) - 3.0).abs() < 1e-12);
}

#[test]
fn sma_uses_only_the_last_window() {
    let closes = [100.0, 1.0, 2.0, 3.0];
    assert!((sma(&closes, 3) - 2.0).abs() < 1e-12);
}

#[test]
fn sma_short_series_falls_back_to_latest_close() {
    let closes = [10.0, 20.0, 30.0];
    assert_eq!(sma(&closes, 20), 30.0);
}
