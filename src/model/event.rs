//! Tagged-union event type the dispatcher and order-event reducer branch on.

use super::{Position, Price, Quantity};
use crate::clock::TimeEvent;
use crate::identifiers::{OrderId, PositionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimal account snapshot. The portfolio/account accounting service itself is an external
/// collaborator; this is only the shape the engine caches and exposes via
/// `account()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEvent {
    pub cash_balance: Decimal,
    pub currency: super::Currency,
    pub timestamp: DateTime<Utc>,
}

/// Portfolio-originated position lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionEventKind {
    Opened(Position),
    Changed(Position),
    Closed(Position),
}

/// Tagged union of everything the dispatcher and order-event reducer can observe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    OrderRejected { order_id: OrderId, reason: String },
    OrderCancelled { order_id: OrderId },
    OrderModified { order_id: OrderId, new_price: Price },
    OrderCancelReject { order_id: OrderId, reason: String },
    OrderFilled {
        order_id: OrderId,
        position_id: Option<PositionId>,
        price: Price,
        quantity: Quantity,
        timestamp: DateTime<Utc>,
    },
    OrderPartiallyFilled {
        order_id: OrderId,
        position_id: Option<PositionId>,
        price: Price,
        quantity: Quantity,
        timestamp: DateTime<Utc>,
    },
    OrderExpired { order_id: OrderId },
    AccountEvent(AccountEvent),
    PositionEvent(PositionEventKind),
    TimeEvent(TimeEvent),
}
