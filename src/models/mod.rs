//! Shared data models spanning the engine layers.

pub mod candle;
pub mod signal;
pub mod snapshot;
pub mod trade;

pub use candle::Candle;
pub use signal::{SignalDirection, TechnicalSignal};
pub use snapshot::MarketSnapshot;
pub use trade::{CycleOutcome, PositionSide, TradeAction};
