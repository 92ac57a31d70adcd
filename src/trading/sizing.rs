//! Position sizing: spec parsing, volatility scaling, and quantity math.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, SizingError};

/// How much capital to commit per trade.
///
/// Parsed from the configured string form: a trailing `%` selects the
/// capital-fraction mode ("10%"), a bare number a fixed notional amount in
/// the quote asset ("20").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingSpec {
    /// Fraction of available capital, in percent (10.0 means 10%).
    PercentOfCapital(f64),
    /// Fixed notional amount in the quote asset.
    Notional(f64),
}

impl FromStr for SizingSpec {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let bad = || ConfigError::BadSizingSpec(raw.to_string());
        let trimmed = raw.trim();
        if let Some(percent) = trimmed.strip_suffix('%') {
            let value: f64 = percent.trim().parse().map_err(|_| bad())?;
            Ok(SizingSpec::PercentOfCapital(value))
        } else {
            let value: f64 = trimmed.parse().map_err(|_| bad())?;
            Ok(SizingSpec::Notional(value))
        }
    }
}

impl fmt::Display for SizingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SizingSpec::PercentOfCapital(percent) => write!(f, "{:.2}%", percent),
            SizingSpec::Notional(amount) => write!(f, "{}", amount),
        }
    }
}

impl SizingSpec {
    /// Capital to commit for this spec, validating the configured bounds
    /// against the available capital.
    pub fn capital_to_use(&self, capital: f64) -> Result<f64, SizingError> {
        match *self {
            SizingSpec::PercentOfCapital(percent) => {
                if !(percent > 0.0 && percent <= 100.0) {
                    return Err(SizingError::PercentOutOfRange(percent));
                }
                Ok(capital * percent / 100.0)
            }
            SizingSpec::Notional(amount) => {
                if amount <= 0.0 {
                    return Err(SizingError::NonPositiveNotional(amount));
                }
                if amount > capital {
                    return Err(SizingError::NotionalExceedsCapital { amount, capital });
                }
                Ok(amount)
            }
        }
    }

    /// Trade quantity in the base asset at the current price.
    pub fn quantity(&self, capital: f64, current_price: f64) -> Result<f64, SizingError> {
        if current_price <= 0.0 {
            return Err(SizingError::NonPositivePrice(current_price));
        }
        Ok(self.capital_to_use(capital)? / current_price)
    }

    /// Rescale the spec by a factor, flooring at 0.1% for percentage specs
    /// and 1e-8 for notional specs. A factor of exactly 1 returns the spec
    /// unchanged.
    pub fn scaled(&self, scale: f64) -> SizingSpec {
        if scale == 1.0 {
            return *self;
        }
        match *self {
            SizingSpec::PercentOfCapital(percent) => {
                SizingSpec::PercentOfCapital((percent * scale).max(0.1))
            }
            SizingSpec::Notional(amount) => SizingSpec::Notional((amount * scale).max(1e-8)),
        }
    }
}

/// Scale factor applied to the configured size at the observed ATR%.
///
/// High volatility halves or trims the size; unusually quiet markets get a
/// small boost.
pub fn volatility_scale(atr_pct: f64) -> f64 {
    if atr_pct >= 4.0 {
        0.5
    } else if atr_pct >= 3.0 {
        0.75
    } else if atr_pct <= 1.0 {
        1.1
    } else {
        1.0
    }
}
