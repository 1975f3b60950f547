//! Order & Position Ledger: three flat registers, an atomic parent→children map, a
//! modify-buffer, the command operations, and the order-event reducer.

use crate::clients::{Account, ExecutionClient, ExecutionCommand, Portfolio};
use crate::identifiers::{OrderId, PositionId, StrategyId, TraderId};
use crate::model::event::Event;
use crate::model::order::{AtomicOrder, Order, OrderPurpose, OrderSide, OrderType, TimeInForce};
use crate::model::{Price, Quantity};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("position {0} not found")]
    UnknownPosition(PositionId),
}

/// A buffered, not-yet-acknowledged price change, coalesced `modify_order`.
#[derive(Debug, Clone, PartialEq)]
struct ModifyOrder {
    order_id: OrderId,
    new_price: Price,
}

/// Holds the three flat order registers, the atomic parent→children map, and the modify
/// coalescing buffer.
#[derive(Debug, Default)]
pub struct OrderLedger {
    entry_orders: HashMap<OrderId, Order>,
    stop_loss_orders: HashMap<OrderId, Order>,
    take_profit_orders: HashMap<OrderId, Order>,
    atomic_order_ids: HashMap<OrderId, Vec<OrderId>>,
    modify_buffer: HashMap<OrderId, ModifyOrder>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `order_id` appears in exactly one of the three registers.
    pub fn is_registered(&self, order_id: &OrderId) -> bool {
        self.entry_orders.contains_key(order_id)
            || self.stop_loss_orders.contains_key(order_id)
            || self.take_profit_orders.contains_key(order_id)
    }

    pub fn is_stop_loss(&self, order_id: &OrderId) -> bool {
        self.stop_loss_orders.contains_key(order_id)
    }

    pub fn atomic_children(&self, parent: &OrderId) -> Option<&[OrderId]> {
        self.atomic_order_ids.get(parent).map(|v| v.as_slice())
    }

    fn register(&mut self, order: &Order) {
        match order.purpose {
            OrderPurpose::Entry => {
                self.entry_orders.insert(order.id.clone(), order.clone());
            }
            OrderPurpose::StopLoss => {
                self.stop_loss_orders.insert(order.id.clone(), order.clone());
            }
            OrderPurpose::TakeProfit => {
                self.take_profit_orders.insert(order.id.clone(), order.clone());
            }
            OrderPurpose::Exit | OrderPurpose::None => {
                self.entry_orders.insert(order.id.clone(), order.clone());
            }
        }
    }

    /// Forwards `SubmitOrder` tagged with trader+strategy+position.
    pub fn submit_order(
        &mut self,
        execution: &mut dyn ExecutionClient,
        order: Order,
        position_id: Option<PositionId>,
        trader_id: TraderId,
        strategy_id: StrategyId,
    ) {
        execution.execute_command(ExecutionCommand::SubmitOrder { order, position_id, trader_id, strategy_id });
    }

    /// Registers then submits. `position_id` is accepted but not stored into an association
    /// map; live order-to-position association is read through the execution client/portfolio
    /// instead.
    pub fn submit_entry_order(
        &mut self,
        execution: &mut dyn ExecutionClient,
        order: Order,
        position_id: Option<PositionId>,
        trader_id: TraderId,
        strategy_id: StrategyId,
    ) {
        self.register(&order);
        self.submit_order(execution, order, position_id, trader_id, strategy_id);
    }

    pub fn submit_stop_loss_order(
        &mut self,
        execution: &mut dyn ExecutionClient,
        order: Order,
        position_id: Option<PositionId>,
        trader_id: TraderId,
        strategy_id: StrategyId,
    ) {
        self.register(&order);
        self.submit_order(execution, order, position_id, trader_id, strategy_id);
    }

    pub fn submit_take_profit_order(
        &mut self,
        execution: &mut dyn ExecutionClient,
        order: Order,
        position_id: Option<PositionId>,
        trader_id: TraderId,
        strategy_id: StrategyId,
    ) {
        self.register(&order);
        self.submit_order(execution, order, position_id, trader_id, strategy_id);
    }

    /// Registers entry/stop-loss/take-profit, populates `atomic_order_ids[entry.id]`, and
    /// forwards `SubmitAtomicOrder`.
    pub fn submit_atomic_order(
        &mut self,
        execution: &mut dyn ExecutionClient,
        atomic: AtomicOrder,
        position_id: Option<PositionId>,
        trader_id: TraderId,
        strategy_id: StrategyId,
    ) {
        self.entry_orders.insert(atomic.entry.id.clone(), atomic.entry.clone());
        self.stop_loss_orders.insert(atomic.stop_loss.id.clone(), atomic.stop_loss.clone());
        if let Some(take_profit) = &atomic.take_profit {
            self.take_profit_orders.insert(take_profit.id.clone(), take_profit.clone());
        }
        self.atomic_order_ids.insert(atomic.entry.id.clone(), atomic.child_ids());

        execution.execute_command(ExecutionCommand::SubmitAtomicOrder {
            atomic,
            position_id,
            trader_id,
            strategy_id,
        });
    }

    /// Coalescing modify: if a modify is already buffered for `order_id`, replace it and
    /// warn; otherwise insert and forward. The upstream source writes into the buffer
    /// unconditionally before checking for a prior entry, so the "already buffered" branch as
    /// literally written never executes; this implements the described coalescing semantics
    /// rather than the as-written control flow.
    pub fn modify_order(&mut self, execution: &mut dyn ExecutionClient, order_id: OrderId, new_price: Price) {
        if self.modify_buffer.contains_key(&order_id) {
            warn!(%order_id, %new_price, "replacing buffered modify with newer price");
        }
        self.modify_buffer.insert(order_id.clone(), ModifyOrder { order_id: order_id.clone(), new_price });
        execution.execute_command(ExecutionCommand::ModifyOrder { order_id, new_price });
    }

    pub fn cancel_order(&mut self, execution: &mut dyn ExecutionClient, order_id: OrderId, reason: String) {
        execution.execute_command(ExecutionCommand::CancelOrder { order_id, reason });
    }

    /// Forwards `CancelOrder` for every active order the execution client associates with
    /// `strategy_id`.
    pub fn cancel_all_orders(&mut self, execution: &mut dyn ExecutionClient, strategy_id: &StrategyId, reason: &str) {
        for order in execution.get_orders_active(strategy_id) {
            execution.execute_command(ExecutionCommand::CancelOrder {
                order_id: order.id,
                reason: reason.to_string(),
            });
        }
    }

    /// Builds and submits a market EXIT order on the opposite side with `position.quantity`.
    /// Warns and returns if the position is already flat.
    pub fn flatten_position(
        &mut self,
        execution: &mut dyn ExecutionClient,
        portfolio: &dyn Portfolio,
        order_id: OrderId,
        exit_side: OrderSide,
        symbol: crate::model::Symbol,
        quantity: Quantity,
        position_id: PositionId,
        trader_id: TraderId,
        strategy_id: StrategyId,
    ) -> Result<(), LedgerError> {
        let position = portfolio.get_position(&position_id).ok_or(LedgerError::UnknownPosition(position_id.clone()))?;
        if position.is_flat() {
            warn!(%position_id, "flatten_position called on a flat position, skipping");
            return Ok(());
        }
        let order = Order::new(
            order_id,
            symbol,
            exit_side,
            OrderType::Market,
            quantity,
            None,
            OrderPurpose::Exit,
            TimeInForce::Day,
            None,
        );
        self.submit_order(execution, order, Some(position_id), trader_id, strategy_id);
        Ok(())
    }

    /// Flattens over every active position for `strategy_id`; positions already flat are skipped
    /// with a warning. The caller supplies freshly generated `OrderId`s, one per active
    /// non-flat position, in iteration order.
    pub fn flatten_all_positions(
        &mut self,
        execution: &mut dyn ExecutionClient,
        portfolio: &dyn Portfolio,
        strategy_id: &StrategyId,
        trader_id: TraderId,
        mut next_order_id: impl FnMut() -> OrderId,
    ) {
        for position in portfolio.get_positions_active(strategy_id) {
            if position.is_flat() {
                warn!(position_id = %position.id, "flatten_all_positions skipping already-flat position");
                continue;
            }
            let exit_side = match position.market_position {
                crate::model::position::MarketPosition::Long => OrderSide::Sell,
                crate::model::position::MarketPosition::Short => OrderSide::Buy,
                crate::model::position::MarketPosition::Flat => continue,
            };
            let order = Order::new(
                next_order_id(),
                position.symbol.clone(),
                exit_side,
                OrderType::Market,
                position.quantity,
                None,
                OrderPurpose::Exit,
                TimeInForce::Day,
                None,
            );
            self.submit_order(execution, order, Some(position.id.clone()), trader_id.clone(), strategy_id.clone());
        }
    }

    fn remove_from_registers(&mut self, order_id: &OrderId) {
        self.entry_orders.remove(order_id);
        self.stop_loss_orders.remove(order_id);
        self.take_profit_orders.remove(order_id);
    }

    fn remove_atomic_children(&mut self, parent: &OrderId) {
        if let Some(children) = self.atomic_order_ids.remove(parent) {
            for child in children {
                self.remove_from_registers(&child);
            }
        }
    }

    /// Drains the modify buffer for `order_id` if present, removing the buffer entry
    /// unconditionally. When `current_price` (as reported by the execution client) is known and
    /// differs from the buffered price, re-issues the buffered `ModifyOrder`; an unresolved
    /// order or an order with no reported price still drops the buffer entry, it just never
    /// re-issues.
    fn drain_modify_buffer(
        &mut self,
        execution: &mut dyn ExecutionClient,
        order_id: &OrderId,
        current_price: Option<Price>,
    ) {
        if let Some(buffered) = self.modify_buffer.remove(order_id) {
            match current_price {
                Some(current_price) if buffered.new_price != current_price => {
                    execution.execute_command(ExecutionCommand::ModifyOrder {
                        order_id: buffered.order_id,
                        new_price: buffered.new_price,
                    });
                }
                Some(_) => {}
                None => {
                    warn!(%order_id, "dropping buffered modify, execution client reports no current price");
                }
            }
        }
    }

    /// Applies an [`Event`] to the ledger per the order-event reducer table. Returns
    /// `Some(position_id)` when the event triggers a flatten that the caller (the dispatcher,
    /// which alone knows `flatten_on_sl_reject`) must follow up on.
    pub fn apply_event(
        &mut self,
        execution: &mut dyn ExecutionClient,
        portfolio: &dyn Portfolio,
        event: &Event,
        flatten_on_sl_reject: bool,
    ) -> Option<PositionId> {
        match event {
            Event::OrderRejected { order_id, reason } => {
                tracing::warn!(%order_id, %reason, "order rejected");
                let mut flatten_target = None;
                if flatten_on_sl_reject && self.is_stop_loss(order_id) {
                    if let Some(position) = portfolio.get_position_for_order(order_id) {
                        if position.is_entered() {
                            flatten_target = Some(position.id);
                        }
                    }
                }
                self.remove_atomic_children(order_id);
                self.remove_from_registers(order_id);
                flatten_target
            }
            Event::OrderCancelled { order_id } => {
                self.remove_atomic_children(order_id);
                self.remove_from_registers(order_id);
                None
            }
            Event::OrderFilled { order_id, .. } => {
                self.atomic_order_ids.remove(order_id);
                self.remove_from_registers(order_id);
                None
            }
            Event::OrderPartiallyFilled { order_id, .. } => {
                tracing::debug!(%order_id, "order partially filled");
                None
            }
            Event::OrderExpired { order_id } => {
                self.remove_atomic_children(order_id);
                self.remove_from_registers(order_id);
                None
            }
            Event::OrderModified { order_id, .. } => {
                let current_price = execution.get_order(order_id).and_then(|order| order.price);
                self.drain_modify_buffer(execution, order_id, current_price);
                None
            }
            Event::OrderCancelReject { order_id, .. } => {
                let current_price = execution.get_order(order_id).and_then(|order| order.price);
                self.drain_modify_buffer(execution, order_id, current_price);
                None
            }
            Event::AccountEvent(_) | Event::PositionEvent(_) | Event::TimeEvent(_) => None,
        }
    }

    pub fn collateral_inquiry(&self, execution: &mut dyn ExecutionClient) {
        execution.execute_command(ExecutionCommand::CollateralInquiry);
    }

    pub fn account(&self, execution: &dyn ExecutionClient) -> Account {
        execution.get_account()
    }

    /// Every residual order left across all three registers, used by `stop()` to emit
    /// one warning per residual item, and by `reset()` to clear state.
    pub fn residual_order_ids(&self) -> Vec<OrderId> {
        self.entry_orders
            .keys()
            .chain(self.stop_loss_orders.keys())
            .chain(self.take_profit_orders.keys())
            .cloned()
            .collect()
    }

    pub fn residual_atomic_parent_ids(&self) -> Vec<OrderId> {
        self.atomic_order_ids.keys().cloned().collect()
    }

    pub fn residual_modify_order_ids(&self) -> Vec<OrderId> {
        self.modify_buffer.keys().cloned().collect()
    }

    /// Clears every register, the atomic map, and the modify buffer. Called by `reset()`.
    pub fn reset(&mut self) {
        self.entry_orders.clear();
        self.stop_loss_orders.clear();
        self.take_profit_orders.clear();
        self.atomic_order_ids.clear();
        self.modify_buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::position::{FillRecord, MarketPosition, Position};
    use crate::model::Symbol;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct FakeExecution {
        commands: RefCell<Vec<ExecutionCommand>>,
        orders: HashMap<OrderId, Order>,
    }

    impl ExecutionClient for FakeExecution {
        fn execute_command(&mut self, command: ExecutionCommand) {
            self.commands.borrow_mut().push(command);
        }
        fn get_order(&self, id: &OrderId) -> Option<Order> {
            self.orders.get(id).cloned()
        }
        fn get_orders(&self, _strategy_id: &StrategyId) -> Vec<Order> {
            self.orders.values().cloned().collect()
        }
        fn get_orders_active(&self, _strategy_id: &StrategyId) -> Vec<Order> {
            self.orders.values().filter(|o| o.is_active()).cloned().collect()
        }
        fn get_orders_completed(&self, _strategy_id: &StrategyId) -> Vec<Order> {
            self.orders.values().filter(|o| o.is_complete()).cloned().collect()
        }
        fn get_account(&self) -> Account {
            Account { cash_balance: dec!(10000), currency: crate::model::Currency::new("USD") }
        }
        fn is_order_exists(&self, id: &OrderId) -> bool {
            self.orders.contains_key(id)
        }
        fn is_order_active(&self, id: &OrderId) -> bool {
            self.orders.get(id).map(|o| o.is_active()).unwrap_or(false)
        }
        fn is_order_complete(&self, id: &OrderId) -> bool {
            self.orders.get(id).map(|o| o.is_complete()).unwrap_or(false)
        }
    }

    #[derive(Debug, Default)]
    struct FakePortfolio {
        positions: HashMap<PositionId, Position>,
        position_for_order: HashMap<OrderId, PositionId>,
    }

    impl Portfolio for FakePortfolio {
        fn get_position(&self, id: &PositionId) -> Option<Position> {
            self.positions.get(id).cloned()
        }
        fn get_positions(&self, _strategy_id: &StrategyId) -> Vec<Position> {
            self.positions.values().cloned().collect()
        }
        fn get_positions_active(&self, _strategy_id: &StrategyId) -> Vec<Position> {
            self.positions.values().filter(|p| !p.is_flat()).cloned().collect()
        }
        fn get_positions_closed(&self, _strategy_id: &StrategyId) -> Vec<Position> {
            self.positions.values().filter(|p| p.is_flat()).cloned().collect()
        }
        fn get_position_for_order(&self, order_id: &OrderId) -> Option<Position> {
            self.position_for_order.get(order_id).and_then(|pid| self.positions.get(pid)).cloned()
        }
        fn is_position_exists(&self, id: &PositionId) -> bool {
            self.positions.contains_key(id)
        }
        fn is_strategy_flat(&self, _strategy_id: &StrategyId) -> bool {
            self.positions.values().all(|p| p.is_flat())
        }
    }

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

    fn trader() -> TraderId {
        TraderId("000".to_string())
    }

    fn strategy() -> StrategyId {
        StrategyId("EMA-001".to_string())
    }

    #[test]
    fn atomic_rejection_cascade_removes_all_children() {
        let mut ledger = OrderLedger::new();
        let mut execution = FakeExecution::default();
        let mut portfolio = FakePortfolio::default();
        let position_id = PositionId("P1".to_string());
        portfolio.positions.insert(
            position_id.clone(),
            Position {
                id: position_id.clone(),
                symbol: Symbol::new("EURUSD", "SIM"),
                market_position: MarketPosition::Long,
                quantity: Quantity(dec!(1000)),
                entry_order_id: OrderId("O1".to_string()),
                fills: vec![FillRecord {
                    order_id: OrderId("O1".to_string()),
                    price: Price(dec!(1.1)),
                    quantity: Quantity(dec!(1000)),
                    timestamp: chrono::Utc::now(),
                }],
            },
        );
        portfolio.position_for_order.insert(OrderId("O1".to_string()), position_id.clone());

        let entry = order("O1", OrderSide::Buy, OrderPurpose::Entry);
        let stop_loss = order("O2", OrderSide::Sell, OrderPurpose::StopLoss);
        let take_profit = order("O3", OrderSide::Sell, OrderPurpose::TakeProfit);
        let atomic = AtomicOrder::new(entry, stop_loss, Some(take_profit)).unwrap();
        ledger.submit_atomic_order(&mut execution, atomic, Some(position_id.clone()), trader(), strategy());

        assert!(ledger.is_registered(&OrderId("O1".to_string())));
        assert!(ledger.is_registered(&OrderId("O2".to_string())));
        assert!(ledger.is_registered(&OrderId("O3".to_string())));

        let flatten_target = ledger.apply_event(
            &mut execution,
            &portfolio,
            &Event::OrderRejected { order_id: OrderId("O1".to_string()), reason: "bad price".to_string() },
            true,
        );

        assert!(!ledger.is_registered(&OrderId("O1".to_string())));
        assert!(!ledger.is_registered(&OrderId("O2".to_string())));
        assert!(!ledger.is_registered(&OrderId("O3".to_string())));
        assert!(ledger.atomic_children(&OrderId("O1".to_string())).is_none());
        assert_eq!(flatten_target, Some(position_id));
    }

    #[test]
    fn modify_coalescing_replaces_buffered_price() {
        let mut ledger = OrderLedger::new();
        let mut execution = FakeExecution::default();
        let mut order = order("O1", OrderSide::Buy, OrderPurpose::Entry);
        order.price = Some(Price(dec!(1.2000)));
        execution.orders.insert(OrderId("O1".to_string()), order);
        let portfolio = FakePortfolio::default();

        ledger.modify_order(&mut execution, OrderId("O1".to_string()), Price(dec!(1.2000)));
        ledger.modify_order(&mut execution, OrderId("O1".to_string()), Price(dec!(1.2005)));
        assert_eq!(ledger.residual_modify_order_ids(), vec![OrderId("O1".to_string())]);

        ledger.apply_event(
            &mut execution,
            &portfolio,
            &Event::OrderModified { order_id: OrderId("O1".to_string()), new_price: Price(dec!(1.2000)) },
            false,
        );

        assert!(ledger.residual_modify_order_ids().is_empty());
        let commands = execution.commands.borrow();
        assert!(matches!(
            commands.last().unwrap(),
            ExecutionCommand::ModifyOrder { new_price, .. } if *new_price == Price(dec!(1.2005))
        ));
    }

    #[test]
    fn modify_buffer_drops_even_when_order_unresolved() {
        let mut ledger = OrderLedger::new();
        let mut execution = FakeExecution::default();
        let portfolio = FakePortfolio::default();

        ledger.modify_order(&mut execution, OrderId("O1".to_string()), Price(dec!(1.2000)));
        assert_eq!(ledger.residual_modify_order_ids(), vec![OrderId("O1".to_string())]);
        let commands_before = execution.commands.borrow().len();

        ledger.apply_event(
            &mut execution,
            &portfolio,
            &Event::OrderModified { order_id: OrderId("O1".to_string()), new_price: Price(dec!(1.2000)) },
            false,
        );

        assert!(ledger.residual_modify_order_ids().is_empty());
        assert_eq!(execution.commands.borrow().len(), commands_before);
    }

    #[test]
    fn order_filled_drops_atomic_parent_children_remain_tracked() {
        let mut ledger = OrderLedger::new();
        let mut execution = FakeExecution::default();
        let portfolio = FakePortfolio::default();

        let entry = order("O1", OrderSide::Buy, OrderPurpose::Entry);
        let stop_loss = order("O2", OrderSide::Sell, OrderPurpose::StopLoss);
        let atomic = AtomicOrder::new(entry, stop_loss, None).unwrap();
        ledger.submit_atomic_order(&mut execution, atomic, None, trader(), strategy());

        ledger.apply_event(
            &mut execution,
            &portfolio,
            &Event::OrderFilled {
                order_id: OrderId("O1".to_string()),
                position_id: None,
                price: Price(dec!(1.1)),
                quantity: Quantity(dec!(1000)),
                timestamp: chrono::Utc::now(),
            },
            false,
        );

        assert!(!ledger.is_registered(&OrderId("O1".to_string())));
        assert!(ledger.is_registered(&OrderId("O2".to_string())), "stop-loss child stays independently tracked");
        assert!(ledger.atomic_children(&OrderId("O1".to_string())).is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let mut ledger = OrderLedger::new();
        let mut execution = FakeExecution::default();
        let entry = order("O1", OrderSide::Buy, OrderPurpose::Entry);
        let stop_loss = order("O2", OrderSide::Sell, OrderPurpose::StopLoss);
        let atomic = AtomicOrder::new(entry, stop_loss, None).unwrap();
        ledger.submit_atomic_order(&mut execution, atomic, None, trader(), strategy());
        ledger.modify_order(&mut execution, OrderId("O2".to_string()), Price(dec!(1.0)));

        ledger.reset();

        assert!(ledger.residual_order_ids().is_empty());
        assert!(ledger.residual_atomic_parent_ids().is_empty());
        assert!(ledger.residual_modify_order_ids().is_empty());
    }
}
