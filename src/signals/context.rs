//! Compact textual market context embedded into the analyst prompt.

use crate::models::{MarketSnapshot, TechnicalSignal};

/// Render a snapshot plus its guardrail signal as a compact context block.
pub fn format_market_context(snapshot: &MarketSnapshot, signal: &TechnicalSignal) -> String {
    let base_asset = snapshot.symbol.replace("USDT", "");
    format!(
        "Symbol: {} | Interval: {}\n\
         Last close: {:.2} USDT | 24h change: {:.2}% | 4h change: {:.2}% | 1h momentum: {:.2}%\n\
         SMA20/SMA60: {:.2}/{:.2} | RSI-14: {:.1} | ATR%: {:.2}% | 24h volatility: {:.2}%\n\
         24h volume: {:.2} {}\n\
         Deterministic guardrail: {} (confidence {:.0}%) - {}",
        snapshot.symbol,
        snapshot.interval,
        snapshot.latest_close,
        snapshot.change_24h * 100.0,
        snapshot.change_4h * 100.0,
        snapshot.momentum_1h * 100.0,
        snapshot.sma_fast,
        snapshot.sma_slow,
        snapshot.rsi,
        snapshot.atr_pct,
        snapshot.volatility_24h * 100.0,
        snapshot.volume_24h,
        base_asset,
        signal.signal,
        signal.confidence * 100.0,
        signal.rationale
    )
}
