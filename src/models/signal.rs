//! Directional signal domain shared by the scorer, fusion, and decision
//! layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-valued market direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl SignalDirection {
    /// Normalize a free-form directional string to the three-valued domain.
    ///
    /// Trims and case-folds. Empty or whitespace-only input is Neutral.
    /// Returns `None` for an unrecognized non-empty value so the caller can
    /// report it before defaulting to Neutral.
    pub fn normalize(raw: &str) -> Option<SignalDirection> {
        let cleaned = raw.trim();
        if cleaned.is_empty() {
            return Some(SignalDirection::Neutral);
        }
        match cleaned.to_ascii_lowercase().as_str() {
            "bullish" => Some(SignalDirection::Bullish),
            "bearish" => Some(SignalDirection::Bearish),
            "neutral" => Some(SignalDirection::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalDirection::Bullish => "Bullish",
            SignalDirection::Bearish => "Bearish",
            SignalDirection::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Deterministic guardrail signal produced once per snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSignal {
    pub signal: SignalDirection,
    /// In [0, 1].
    pub confidence: f64,
    /// Ordered, human-readable reasons for each contributing score term.
    pub rationale: String,
}
