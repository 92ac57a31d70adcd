//! Configuration and validation errors shared across the engine layers.
//!
//! Collaborator-specific failures (market data, exchange, opinion) live next
//! to their clients under `services`.

use thiserror::Error;

/// A value supplied by configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported interval '{0}': expected a number followed by m, h, or d")]
    BadInterval(String),
    #[error("invalid position size spec '{0}': expected a percentage like \"10%\" or a numeric amount")]
    BadSizingSpec(String),
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for {name}: '{value}'")]
    BadValue { name: &'static str, value: String },
}

/// A sizing input is out of range for the current account state.
///
/// These abort the sizing/order step only; the safety path of the cycle does
/// not depend on them.
#[derive(Debug, Error)]
pub enum SizingError {
    #[error("percentage must be between 0 and 100, got {0}%")]
    PercentOutOfRange(f64),
    #[error("position size must be positive, got {0}")]
    NonPositiveNotional(f64),
    #[error("fixed amount {amount} exceeds available capital {capital:.2}")]
    NotionalExceedsCapital { amount: f64, capital: f64 },
    #[error("current price must be positive, got {0}")]
    NonPositivePrice(f64),
}
