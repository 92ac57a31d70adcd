//! Position and action domain for the decision state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an open position. Absence of a position is `Option::None` at the
/// call sites; the side is queried fresh from the exchange each cycle, never
/// cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Map exchange-specific side labels onto the internal side domain.
    ///
    /// Labels are prefix-matched after trimming and upcasing, so "BUY",
    /// "buy_open" and "LONG" all normalize to Long. Unrecognized labels
    /// return `None` and are reported by the caller.
    pub fn from_label(raw: &str) -> Option<PositionSide> {
        let side = raw.trim().to_ascii_uppercase();
        const LONG_LABELS: [&str; 3] = ["BUY", "BID", "LONG"];
        const SHORT_LABELS: [&str; 3] = ["SELL", "ASK", "SHORT"];
        if LONG_LABELS.iter().any(|label| side.starts_with(label)) {
            Some(PositionSide::Long)
        } else if SHORT_LABELS.iter().any(|label| side.starts_with(label)) {
            Some(PositionSide::Short)
        } else {
            None
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => f.write_str("long"),
            PositionSide::Short => f.write_str("short"),
        }
    }
}

/// Position-management action chosen by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    OpenLong,
    OpenShort,
    /// Close the short, then open a long. Not atomic: if the open fails after
    /// the close succeeded, exposure ends flat.
    FlipToLong,
    FlipToShort,
    Hold,
    Close,
    NoOp,
    /// Unconditional flatten issued by the failsafe path only.
    EmergencyClose,
}

/// Terminal state of one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// The decision path completed but an indicator or opinion fallback fired
    /// along the way.
    CompletedWithFallback,
    /// The decision path failed and exposure is flat.
    FailedFlattened,
    /// The decision path failed and the emergency close could not confirm a
    /// flat book.
    FailedUnflattened,
}
