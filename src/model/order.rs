//! Order and atomic-order types and the lifecycle states they pass through.

use super::{Price, Quantity, Symbol};
use crate::identifiers::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side, used when sizing stop-loss/take-profit children and flatten
    /// orders.
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

/// Role tag on an order (glossary: Purpose).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderPurpose {
    Entry,
    StopLoss,
    TakeProfit,
    Exit,
    None,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    Day,
    GoodTillCancel,
    ImmediateOrCancel,
    FillOrKill,
    GoodTillDate,
}

/// Order type: whether `price` is meaningful. A `Market` order has no price; a `Limit` or `Stop`
/// order's `price` is the order's limit/trigger price.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
}

/// Where an [`Order`] sits in its lifecycle. Transitions are driven by the order-event reducer
/// applying execution reports; the ledger never advances this field speculatively.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderLifecycleState {
    Initialized,
    Submitted,
    Working,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("atomic order stop-loss side must be opposite the entry side")]
    StopLossSideMismatch,
    #[error("atomic order take-profit side must be opposite the entry side")]
    TakeProfitSideMismatch,
}

/// `(OrderId, Symbol, side, quantity, optional price, purpose, time_in_force, expire_time,
/// lifecycle_state)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub price: Option<Price>,
    pub purpose: OrderPurpose,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<DateTime<Utc>>,
    pub lifecycle_state: OrderLifecycleState,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        symbol: Symbol,
        side: OrderSide,
        order_type: OrderType,
        quantity: Quantity,
        price: Option<Price>,
        purpose: OrderPurpose,
        time_in_force: TimeInForce,
        expire_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            symbol,
            side,
            order_type,
            quantity,
            price,
            purpose,
            time_in_force,
            expire_time,
            lifecycle_state: OrderLifecycleState::Initialized,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.lifecycle_state,
            OrderLifecycleState::Initialized
                | OrderLifecycleState::Submitted
                | OrderLifecycleState::Working
                | OrderLifecycleState::PartiallyFilled
        )
    }

    pub fn is_complete(&self) -> bool {
        !self.is_active()
    }
}

/// Grouped submission of an entry order with one or two contingent child orders (glossary:
/// Atomic order). Invariant: `stop_loss.side == opposite(entry.side)`; if `take_profit` is
/// present, `take_profit.side == opposite(entry.side)` too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicOrder {
    pub entry: Order,
    pub stop_loss: Order,
    pub take_profit: Option<Order>,
}

impl AtomicOrder {
    pub fn new(entry: Order, stop_loss: Order, take_profit: Option<Order>) -> Result<Self, OrderError> {
        if stop_loss.side != entry.side.opposite() {
            return Err(OrderError::StopLossSideMismatch);
        }
        if let Some(take_profit) = &take_profit {
            if take_profit.side != entry.side.opposite() {
                return Err(OrderError::TakeProfitSideMismatch);
            }
        }
        Ok(Self { entry, stop_loss, take_profit })
    }

    /// IDs of every child order (stop-loss, and take-profit if present) in registration order.
    pub fn child_ids(&self) -> Vec<OrderId> {
        let mut ids = vec![self.stop_loss.id.clone()];
        if let Some(take_profit) = &self.take_profit {
            ids.push(take_profit.id.clone());
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(id: &str, side: OrderSide, purpose: OrderPurpose) -> Order {
        Order::new(
            OrderId(id.to_string()),
            Symbol::new("EURUSD", "SIM"),
            side,
            OrderType::Market,
            Quantity(dec!(1000)),
            None,
            purpose,
            TimeInForce::Day,
            None,
        )
    }

    #[test]
    fn atomic_order_rejects_same_side_stop_loss() {
        let entry = order("O1", OrderSide::Buy, OrderPurpose::Entry);
        let stop_loss = order("O2", OrderSide::Buy, OrderPurpose::StopLoss);
        assert_eq!(
            AtomicOrder::new(entry, stop_loss, None).unwrap_err(),
            OrderError::StopLossSideMismatch
        );
    }

    #[test]
    fn atomic_order_accepts_opposite_side_children() {
        let entry = order("O1", OrderSide::Buy, OrderPurpose::Entry);
        let stop_loss = order("O2", OrderSide::Sell, OrderPurpose::StopLoss);
        let take_profit = order("O3", OrderSide::Sell, OrderPurpose::TakeProfit);
        let atomic = AtomicOrder::new(entry, stop_loss, Some(take_profit)).unwrap();
        assert_eq!(
            atomic.child_ids(),
            vec![OrderId("O2".to_string()), OrderId("O3".to_string())]
        );
    }
}
