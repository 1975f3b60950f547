//! OHLCV candle for a `(Symbol, BarSpecification)` over a fixed interval.

use super::{Price, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarError {
    #[error("bar high {high} must be >= max(open, close)")]
    HighBelowOpenClose { high: String },
    #[error("bar low {low} must be <= min(open, close)")]
    LowAboveOpenClose { low: String },
}

/// `(open, high, low, close, volume, timestamp)`. Construction enforces
/// `high >= max(open, close)` and `low <= min(open, close)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Quantity,
    pub timestamp: DateTime<Utc>,
}

impl Bar {
    pub fn new(
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, BarError> {
        let max_open_close = open.max(close);
        let min_open_close = open.min(close);

        if high < max_open_close {
            return Err(BarError::HighBelowOpenClose { high: high.to_string() });
        }
        if low > min_open_close {
            return Err(BarError::LowAboveOpenClose { low: low.to_string() });
        }

        Ok(Self { open, high, low, close, volume, timestamp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn p(v: rust_decimal::Decimal) -> Price {
        Price(v)
    }

    #[test]
    fn rejects_high_below_close() {
        let err = Bar::new(p(dec!(10)), p(dec!(10.5)), p(dec!(9)), p(dec!(11)), Quantity(dec!(1)), Utc::now());
        assert!(err.is_err());
    }

    #[test]
    fn rejects_low_above_open() {
        let err = Bar::new(p(dec!(10)), p(dec!(11)), p(dec!(10.5)), p(dec!(10.2)), Quantity(dec!(1)), Utc::now());
        assert!(err.is_err());
    }

    #[test]
    fn accepts_well_formed_bar() {
        let bar = Bar::new(p(dec!(10)), p(dec!(11)), p(dec!(9)), p(dec!(10.5)), Quantity(dec!(100)), Utc::now());
        assert!(bar.is_ok());
    }
}
