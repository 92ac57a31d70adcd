//! Deterministic guardrail scoring over a market snapshot.
//!
//! A lightweight additive score, not a strategy of its own: its job is to
//! sanity-check the externally supplied outlook. Identical snapshots always
//! yield identical output, rationale string included.

use crate::models::{MarketSnapshot, SignalDirection, TechnicalSignal};

/// Score above which the signal is Bullish; mirrored for Bearish.
pub const DIRECTION_THRESHOLD: f64 = 0.15;

/// Derive the guardrail signal from one snapshot.
pub fn derive_signal(snapshot: &MarketSnapshot) -> TechnicalSignal {
    let mut score = 0.0;
    let mut rationale_parts: Vec<String> = Vec::new();

    let trend_bias = if snapshot.latest_close > snapshot.sma_slow {
        0.25
    } else {
        -0.25
    };
    score += trend_bias;
    rationale_parts.push(format!(
        "Price {} long SMA ({:.0} vs {:.0})",
        if trend_bias > 0.0 { "above" } else { "below" },
        snapshot.latest_close,
        snapshot.sma_slow
    ));

    let ma_cross_bias = if snapshot.sma_fast > snapshot.sma_slow {
        0.2
    } else {
        -0.2
    };
    score += ma_cross_bias;
    rationale_parts.push(format!(
        "SMA20{}SMA60",
        if ma_cross_bias > 0.0 { ">" } else { "<" }
    ));

    if snapshot.rsi >= 55.0 {
        score += ((snapshot.rsi - 55.0) / 100.0).min(0.2);
        rationale_parts.push(format!("RSI strong ({:.1})", snapshot.rsi));
    } else if snapshot.rsi <= 45.0 {
        score -= ((45.0 - snapshot.rsi) / 100.0).min(0.2);
        rationale_parts.push(format!("RSI weak ({:.1})", snapshot.rsi));
    }

    if snapshot.momentum_1h >= 0.002 {
        score += 0.15;
        rationale_parts.push(format!(
            "1h momentum +{:.2}%",
            snapshot.momentum_1h * 100.0
        ));
    } else if snapshot.momentum_1h <= -0.002 {
        score -= 0.15;
        rationale_parts.push(format!("1h momentum {:.2}%", snapshot.momentum_1h * 100.0));
    }

    if snapshot.change_24h >= 0.005 {
        score += 0.1;
        rationale_parts.push(format!("24h change +{:.2}%", snapshot.change_24h * 100.0));
    } else if snapshot.change_24h <= -0.005 {
        score -= 0.1;
        rationale_parts.push(format!("24h change {:.2}%", snapshot.change_24h * 100.0));
    }

    let signal = if score > DIRECTION_THRESHOLD {
        SignalDirection::Bullish
    } else if score < -DIRECTION_THRESHOLD {
        SignalDirection::Bearish
    } else {
        SignalDirection::Neutral
    };
    let confidence = (0.55 + score.abs()).clamp(0.45, 0.95);

    TechnicalSignal {
        signal,
        confidence,
        rationale: rationale_parts.join("; "),
    }
}
