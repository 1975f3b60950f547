//! Fixed-precision decimal money types. All comparisons and arithmetic are precision-aware,
//! never floating-point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A price, always backed by [`Decimal`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Price(pub Decimal);

/// A quantity, always backed by [`Decimal`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Quantity(pub Decimal);

macro_rules! decimal_newtype {
    ($ty:ident) => {
        impl $ty {
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            /// Rounds to `precision` decimal places, matching an instrument's tick precision.
            pub fn rounded(&self, precision: u32) -> Self {
                Self(self.0.round_dp(precision))
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Decimal> for $ty {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }

        impl Add for $ty {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }
    };
}

decimal_newtype!(Price);
decimal_newtype!(Quantity);

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_ordering_is_decimal_precise() {
        assert!(Price(dec!(1.10000)) == Price(dec!(1.1)));
        assert!(Price(dec!(1.10001)) > Price(dec!(1.1)));
    }

    #[test]
    fn rounded_matches_instrument_tick_precision() {
        let price = Price(dec!(1.234567));
        assert_eq!(price.rounded(4), Price(dec!(1.2346)));
    }
}
