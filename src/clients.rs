//! External interfaces consumed by the engine: `DataClient`, `ExecutionClient`, `Portfolio`.
//!
//! These collaborators — market-data delivery, order transport/fill reporting, and
//! portfolio/account accounting — are explicitly out of scope to *implement*; the
//! engine only depends on their trait shape so that a real client can be plugged in.

use crate::identifiers::{OrderId, PositionId, StrategyId, TraderId};
use crate::model::{AtomicOrder, Bar, BarType, Currency, Instrument, Order, Position, Price, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimal account snapshot exposed to strategy authors via `EngineCore::account()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub cash_balance: Decimal,
    pub currency: Currency,
}

/// Commands the engine forwards to an [`ExecutionClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionCommand {
    CollateralInquiry,
    SubmitOrder {
        order: Order,
        position_id: Option<PositionId>,
        trader_id: TraderId,
        strategy_id: StrategyId,
    },
    SubmitAtomicOrder {
        atomic: AtomicOrder,
        position_id: Option<PositionId>,
        trader_id: TraderId,
        strategy_id: StrategyId,
    },
    ModifyOrder { order_id: OrderId, new_price: Price },
    CancelOrder { order_id: OrderId, reason: String },
}

/// Order transport and fill reporting.
pub trait ExecutionClient {
    fn execute_command(&mut self, command: ExecutionCommand);

    fn get_order(&self, id: &OrderId) -> Option<Order>;
    fn get_orders(&self, strategy_id: &StrategyId) -> Vec<Order>;
    fn get_orders_active(&self, strategy_id: &StrategyId) -> Vec<Order>;
    fn get_orders_completed(&self, strategy_id: &StrategyId) -> Vec<Order>;

    fn get_account(&self) -> Account;

    fn is_order_exists(&self, id: &OrderId) -> bool;
    fn is_order_active(&self, id: &OrderId) -> bool;
    fn is_order_complete(&self, id: &OrderId) -> bool;
}

/// Tick/bar delivery and historical download.
pub trait DataClient {
    fn symbols(&self) -> Vec<Symbol>;
    fn get_instrument(&self, symbol: &Symbol) -> Option<Instrument>;

    fn historical_bars(&mut self, bar_type: &BarType, quantity: usize, on_bar: &mut dyn FnMut(Bar));
    fn historical_bars_from(&mut self, bar_type: &BarType, from_ts: DateTime<Utc>, on_bar: &mut dyn FnMut(Bar));

    fn subscribe_bars(&mut self, bar_type: &BarType);
    fn unsubscribe_bars(&mut self, bar_type: &BarType);
    fn subscribe_ticks(&mut self, symbol: &Symbol);
    fn unsubscribe_ticks(&mut self, symbol: &Symbol);
    fn subscribe_instrument(&mut self, symbol: &Symbol);
}

/// Position and account accounting.
pub trait Portfolio {
    fn get_position(&self, id: &PositionId) -> Option<Position>;
    fn get_positions(&self, strategy_id: &StrategyId) -> Vec<Position>;
    fn get_positions_active(&self, strategy_id: &StrategyId) -> Vec<Position>;
    fn get_positions_closed(&self, strategy_id: &StrategyId) -> Vec<Position>;
    fn get_position_for_order(&self, order_id: &OrderId) -> Option<Position>;
    fn is_position_exists(&self, id: &PositionId) -> bool;
    fn is_strategy_flat(&self, strategy_id: &StrategyId) -> bool;
}
