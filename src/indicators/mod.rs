//! Deterministic technical indicators computed from a candle series.
//!
//! Every indicator is a pure function of the series. Computations that lack
//! enough history fall back to a documented default instead of surfacing an
//! undefined value, so snapshot assembly never fails on a thin series.

pub mod interval;
pub mod momentum;
pub mod snapshot;
pub mod trend;
pub mod volatility;

pub use interval::{bars_for_period, interval_to_minutes};
pub use snapshot::build_snapshot;
