//! Decision state machine mapping (fused signal, position side) to an
//! action.

use crate::models::{PositionSide, SignalDirection, TradeAction};

/// Transition table keyed by (signal, current side).
///
/// The single exhaustive match over the tuple is the 9-entry lookup; the
/// compiler guarantees full coverage. The emergency action never appears
/// here, it is reserved for the failsafe path.
pub fn decide(signal: SignalDirection, side: Option<PositionSide>) -> TradeAction {
    use PositionSide::{Long, Short};
    use SignalDirection::{Bearish, Bullish, Neutral};

    match (signal, side) {
        (Bullish, None) => TradeAction::OpenLong,
        (Bullish, Some(Long)) => TradeAction::Hold,
        (Bullish, Some(Short)) => TradeAction::FlipToLong,
        (Bearish, None) => TradeAction::OpenShort,
        (Bearish, Some(Long)) => TradeAction::FlipToShort,
        (Bearish, Some(Short)) => TradeAction::Hold,
        (Neutral, None) => TradeAction::NoOp,
        (Neutral, Some(Long)) => TradeAction::Close,
        (Neutral, Some(Short)) => TradeAction::Close,
    }
}
