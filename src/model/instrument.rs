//! Tradable instrument metadata.

use super::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency code, eg/ "USD", "EUR".
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broad instrument class. Risk-management policy and order-routing per class are out of scope
/// here; this is metadata only.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum SecurityType {
    Forex,
    Equity,
    Future,
    Cfd,
    Crypto,
}

/// `(Symbol, tick_size, tick_precision, security_type, base_currency, quote_currency)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    pub tick_size: Decimal,
    pub tick_precision: u32,
    pub security_type: SecurityType,
    pub base_currency: Currency,
    pub quote_currency: Currency,
}
