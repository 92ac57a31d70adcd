//! Signal derivation and fusion.

pub mod context;
pub mod fusion;
pub mod scorer;

pub use context::format_market_context;
pub use fusion::{fuse, FusionConfig};
pub use scorer::derive_signal;
