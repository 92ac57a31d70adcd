//! Stop-loss derivation.

use crate::models::PositionSide;

/// Stop-loss trigger price offset `pct` percent from entry, on the losing
/// side of the position.
///
/// Callers validate `entry_price > 0` and `pct >= 0` upstream; the function
/// itself is a pure price transform.
pub fn stop_loss_price(entry_price: f64, side: PositionSide, pct: f64) -> f64 {
    match side {
        PositionSide::Long => entry_price * (1.0 - pct / 100.0),
        PositionSide::Short => entry_price * (1.0 + pct / 100.0),
    }
}
