//! Rule-based fusion of the primary outlook with the technical guardrail.
//!
//! The primary opinion remains the driver; a high-confidence guardrail can
//! break a neutral tie or neuter a conflicting bet. The rules form a
//! precedence chain: only the first matching rule fires.

use crate::events::{DecisionEvent, EventSink};
use crate::models::{SignalDirection, TechnicalSignal};

/// Fusion thresholds. Both are hand-tuned, so they are parameters rather
/// than constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    /// Guardrail confidence needed to break a Neutral primary opinion.
    pub neutral_tiebreak_confidence: f64,
    /// Guardrail confidence needed to flatten an active disagreement to
    /// Neutral.
    pub conflict_confidence: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            neutral_tiebreak_confidence: 0.55,
            conflict_confidence: 0.75,
        }
    }
}

/// Fuse the free-form primary signal with the optional guardrail signal.
///
/// The guardrail is absent when the indicator pipeline failed; the primary
/// signal then passes through unchanged.
pub fn fuse(
    primary_raw: &str,
    guardrail: Option<&TechnicalSignal>,
    config: &FusionConfig,
    events: &dyn EventSink,
) -> SignalDirection {
    let primary = match SignalDirection::normalize(primary_raw) {
        Some(direction) => direction,
        None => {
            events.emit(DecisionEvent::UnrecognizedSignal {
                raw: primary_raw.to_string(),
            });
            SignalDirection::Neutral
        }
    };

    let fired = |rule: u8, result: SignalDirection| {
        events.emit(DecisionEvent::FusionRuleFired { rule, result });
        result
    };

    let Some(guardrail) = guardrail else {
        return fired(1, primary);
    };

    if primary == guardrail.signal {
        return fired(2, primary);
    }
    if primary == SignalDirection::Neutral
        && guardrail.confidence >= config.neutral_tiebreak_confidence
    {
        return fired(3, guardrail.signal);
    }
    if guardrail.signal == SignalDirection::Neutral {
        return fired(4, primary);
    }
    // From here the two signals actively disagree: one Bullish, one Bearish.
    if guardrail.confidence >= config.conflict_confidence {
        return fired(5, SignalDirection::Neutral);
    }
    fired(6, primary)
}
