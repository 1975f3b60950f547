//! Single bid/ask quote observation for a symbol.

use super::{Price, Symbol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    #[error("tick bid {bid} must be <= ask {ask}")]
    BidExceedsAsk { bid: String, ask: String },
}

/// `(Symbol, bid, ask, timestamp)`. Construction enforces `bid <= ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: Symbol,
    pub bid: Price,
    pub ask: Price,
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    pub fn new(symbol: Symbol, bid: Price, ask: Price, timestamp: DateTime<Utc>) -> Result<Self, TickError> {
        if bid > ask {
            return Err(TickError::BidExceedsAsk {
                bid: bid.to_string(),
                ask: ask.to_string(),
            });
        }
        Ok(Self { symbol, bid, ask, timestamp })
    }

    /// Midpoint of bid/ask.
    pub fn mid(&self) -> Price {
        Price((self.bid.0 + self.ask.0) / rust_decimal::Decimal::TWO)
    }
}
