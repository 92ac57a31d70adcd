//! Structured decision events surfaced by the core.
//!
//! Decision-relevant moments (fallback used, fusion rule fired, action
//! chosen, emergency triggered) are reported through an event sink so hosts
//! can route them; the default sink feeds the tracing pipeline.

use std::sync::Mutex;
use tracing::{info, warn};

use crate::models::{SignalDirection, TradeAction};

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionEvent {
    /// The indicator/guardrail pipeline failed; the cycle continues on the
    /// degraded market context.
    SnapshotFallback { reason: String },
    /// The opinion source failed; the primary signal defaulted to Neutral.
    OpinionFallback { reason: String },
    /// A primary signal string outside the three-valued domain was treated
    /// as Neutral.
    UnrecognizedSignal { raw: String },
    /// An exchange position side label outside the known set was treated as
    /// no position.
    UnrecognizedPositionSide { raw: String },
    /// Which fusion rule resolved the final signal (1-based, per the
    /// precedence chain).
    FusionRuleFired { rule: u8, result: SignalDirection },
    /// Fusion changed the primary signal.
    SignalAdjusted {
        from: SignalDirection,
        to: SignalDirection,
    },
    /// The configured position size was rescaled from the observed ATR%.
    VolatilityScaled {
        atr_pct: f64,
        scale: f64,
        spec: String,
    },
    ActionChosen {
        action: TradeAction,
        signal: SignalDirection,
    },
    /// A stop-loss was configured but could not be attached; the opened
    /// position stands.
    StopLossSkipped { reason: String },
    EmergencyTriggered { error: String },
    EmergencyCloseFailed { error: String },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: DecisionEvent);
}

/// Default sink: routes events into the tracing pipeline.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: DecisionEvent) {
        match &event {
            DecisionEvent::SnapshotFallback { reason } => {
                warn!(reason = %reason, "market context fallback in use");
            }
            DecisionEvent::OpinionFallback { reason } => {
                warn!(reason = %reason, "opinion fallback: primary signal defaulted to Neutral");
            }
            DecisionEvent::UnrecognizedSignal { raw } => {
                warn!(raw = %raw, "unexpected signal value, defaulting to Neutral");
            }
            DecisionEvent::UnrecognizedPositionSide { raw } => {
                warn!(raw = %raw, "unrecognized position side, treating as no position");
            }
            DecisionEvent::FusionRuleFired { rule, result } => {
                info!(rule, result = %result, "fusion rule fired");
            }
            DecisionEvent::SignalAdjusted { from, to } => {
                info!(from = %from, to = %to, "signal adjusted after guardrail check");
            }
            DecisionEvent::VolatilityScaled {
                atr_pct,
                scale,
                spec,
            } => {
                info!(atr_pct, scale, spec = %spec, "position size rescaled by volatility");
            }
            DecisionEvent::ActionChosen { action, signal } => {
                info!(action = ?action, signal = %signal, "trading action chosen");
            }
            DecisionEvent::StopLossSkipped { reason } => {
                warn!(reason = %reason, "stop-loss not attached");
            }
            DecisionEvent::EmergencyTriggered { error } => {
                warn!(error = %error, "emergency flatten triggered");
            }
            DecisionEvent::EmergencyCloseFailed { error } => {
                warn!(error = %error, "emergency close failed");
            }
        }
    }
}

/// Buffering sink used by tests and offline inspection.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DecisionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events.lock().expect("event buffer poisoned").clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DecisionEvent) {
        self.events.lock().expect("event buffer poisoned").push(event);
    }
}
