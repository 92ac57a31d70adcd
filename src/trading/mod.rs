//! Position sizing, risk controls, and the decision state machine.

pub mod cycle;
pub mod decision;
pub mod risk;
pub mod sizing;

pub use cycle::{CycleConfig, TradeCycle};
pub use decision::decide;
pub use risk::stop_loss_price;
pub use sizing::{volatility_scale, SizingSpec};
