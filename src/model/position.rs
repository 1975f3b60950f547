//! Aggregate holding in a symbol.

use super::{Price, Quantity, Symbol};
use crate::identifiers::{OrderId, PositionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MarketPosition {
    Flat,
    Long,
    Short,
}

/// A single fill applied to a [`Position`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    pub order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: DateTime<Utc>,
}

/// `(PositionId, Symbol, market_position, quantity, entry order, fills)`. Created by the
/// portfolio (out of scope here) on first fill, closed when net quantity returns to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: Symbol,
    pub market_position: MarketPosition,
    pub quantity: Quantity,
    pub entry_order_id: OrderId,
    pub fills: Vec<FillRecord>,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self.market_position, MarketPosition::Flat)
    }

    /// True once the position has at least one fill recorded against its entry order, ie/ the
    /// entry has actually reached the venue.
    pub fn is_entered(&self) -> bool {
        !self.fills.is_empty()
    }
}
