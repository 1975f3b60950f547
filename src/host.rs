//! Strategy Host & Lifecycle: `EngineCore` is the engine-side state a strategy is given
//! access to; `StrategyHost` pairs it with the user's [`Strategy`] implementation.
//!
//! `EngineCore` and `StrategyHost` are split into two structs (rather than one) so that
//! `strategy.on_tick(&mut core, ...)` type calls don't require borrowing `self` mutably twice —
//! the strategy and the engine state it operates on are disjoint fields.

use crate::clients::{Account, DataClient, ExecutionClient, Portfolio};
use crate::clock::Clock;
use crate::error::{assert_invariant, EngineError};
use crate::identifiers::{OrderId, OrderIdGenerator, PositionId, PositionIdGenerator, StrategyId, TraderId};
use crate::indicator::IndicatorRegistry;
use crate::ledger::OrderLedger;
use crate::market_data::MarketDataCache;
use crate::model::order::{AtomicOrder, Order, OrderSide};
use crate::model::{Bar, BarType, Price, Quantity, Symbol};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{error, warn};

/// Configuration options governing a strategy's lifecycle behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// On `OrderRejected` for a registered stop-loss, flatten the associated position.
    pub flatten_on_sl_reject: bool,
    /// As above, during `stop()`.
    pub flatten_on_stop: bool,
    /// During `stop()`, issue `CancelOrder` for every active order owned by this strategy.
    pub cancel_all_orders_on_stop: bool,
    /// Max bars retained per `BarType`. Must be positive.
    pub bar_capacity: usize,
}

impl StrategyConfig {
    pub fn new(bar_capacity: usize) -> Result<Self, EngineError> {
        if bar_capacity == 0 {
            return Err(EngineError::Precondition("bar_capacity must be positive".to_string()));
        }
        Ok(Self {
            flatten_on_sl_reject: false,
            flatten_on_stop: false,
            cancel_all_orders_on_stop: false,
            bar_capacity,
        })
    }

    pub fn with_flatten_on_sl_reject(mut self, value: bool) -> Self {
        self.flatten_on_sl_reject = value;
        self
    }

    pub fn with_flatten_on_stop(mut self, value: bool) -> Self {
        self.flatten_on_stop = value;
        self
    }

    pub fn with_cancel_all_orders_on_stop(mut self, value: bool) -> Self {
        self.cancel_all_orders_on_stop = value;
        self
    }
}

/// The host's lifecycle state. `reset` is only permitted from `Stopped` or `Created` (never from
/// `Running`).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HostState {
    Created,
    Running,
    Stopped,
    Disposed,
}

/// Everything a strategy's hooks read and mutate, minus the strategy itself.
pub struct EngineCore<E, D, P> {
    pub trader_id: TraderId,
    pub strategy_id: StrategyId,
    pub config: StrategyConfig,
    pub state: HostState,
    pub clock: Rc<RefCell<dyn Clock>>,
    pub market_data: MarketDataCache,
    pub indicators: IndicatorRegistry,
    pub ledger: OrderLedger,
    pub order_ids: OrderIdGenerator,
    pub position_ids: PositionIdGenerator,
    pub execution: E,
    pub data: D,
    pub portfolio: P,
    account_cache: Option<Account>,
}

impl<E: ExecutionClient, D: DataClient, P: Portfolio> EngineCore<E, D, P> {
    pub fn new(
        trader_id: TraderId,
        strategy_id: StrategyId,
        config: StrategyConfig,
        clock: Rc<RefCell<dyn Clock>>,
        execution: E,
        data: D,
        portfolio: P,
    ) -> Self {
        let order_ids = OrderIdGenerator::new(trader_id.0.clone(), strategy_id.0.clone(), clock.clone());
        let position_ids = PositionIdGenerator::new(trader_id.0.clone(), strategy_id.0.clone(), clock.clone());
        Self {
            trader_id,
            strategy_id,
            config,
            state: HostState::Created,
            clock,
            market_data: MarketDataCache::new(1),
            indicators: IndicatorRegistry::new(),
            ledger: OrderLedger::new(),
            order_ids,
            position_ids,
            execution,
            data,
            portfolio,
            account_cache: None,
        }
        .with_bar_capacity_applied()
    }

    fn with_bar_capacity_applied(mut self) -> Self {
        self.market_data = MarketDataCache::new(self.config.bar_capacity);
        self
    }

    pub fn is_running(&self) -> bool {
        self.state == HostState::Running
    }

    /// Cached read-through over `ExecutionClient::get_account`, invalidated by `AccountEvent`.
    pub fn account(&mut self) -> Account {
        if self.account_cache.is_none() {
            self.account_cache = Some(self.execution.get_account());
        }
        self.account_cache.clone().expect("just populated")
    }

    pub fn invalidate_account_cache(&mut self) {
        self.account_cache = None;
    }

    /// Backtest-only operation: swaps in a new clock and rebuilds `order_ids`/`position_ids`
    /// against it, so identifiers minted after the swap are tagged with the new clock's time
    /// domain instead of the old one.
    pub fn change_clock(&mut self, clock: Rc<RefCell<dyn Clock>>) {
        self.clock = clock.clone();
        self.order_ids.rebuild(clock.clone());
        self.position_ids.rebuild(clock);
    }

    /// Returns the data client's known symbols, not resolved `Instrument` objects — callers that
    /// want instrument metadata should go through `DataClient::get_instrument` directly.
    pub fn instruments(&self) -> Vec<Symbol> {
        self.data.symbols()
    }

    pub fn submit_order(&mut self, order: Order, position_id: Option<PositionId>) {
        self.ledger.submit_order(
            &mut self.execution,
            order,
            position_id,
            self.trader_id.clone(),
            self.strategy_id.clone(),
        );
    }

    pub fn submit_entry_order(&mut self, order: Order, position_id: Option<PositionId>) {
        self.ledger.submit_entry_order(
            &mut self.execution,
            order,
            position_id,
            self.trader_id.clone(),
            self.strategy_id.clone(),
        );
    }

    pub fn submit_stop_loss_order(&mut self, order: Order, position_id: Option<PositionId>) {
        self.ledger.submit_stop_loss_order(
            &mut self.execution,
            order,
            position_id,
            self.trader_id.clone(),
            self.strategy_id.clone(),
        );
    }

    pub fn submit_take_profit_order(&mut self, order: Order, position_id: Option<PositionId>) {
        self.ledger.submit_take_profit_order(
            &mut self.execution,
            order,
            position_id,
            self.trader_id.clone(),
            self.strategy_id.clone(),
        );
    }

    pub fn submit_atomic_order(&mut self, atomic: AtomicOrder, position_id: Option<PositionId>) {
        self.ledger.submit_atomic_order(
            &mut self.execution,
            atomic,
            position_id,
            self.trader_id.clone(),
            self.strategy_id.clone(),
        );
    }

    pub fn modify_order(&mut self, order_id: OrderId, new_price: Price) {
        self.ledger.modify_order(&mut self.execution, order_id, new_price);
    }

    pub fn cancel_order(&mut self, order_id: OrderId, reason: String) {
        self.ledger.cancel_order(&mut self.execution, order_id, reason);
    }

    pub fn cancel_all_orders(&mut self, reason: &str) {
        self.ledger.cancel_all_orders(&mut self.execution, &self.strategy_id, reason);
    }

    pub fn flatten_position(
        &mut self,
        order_id: OrderId,
        exit_side: OrderSide,
        symbol: Symbol,
        quantity: Quantity,
        position_id: PositionId,
    ) -> Result<(), EngineError> {
        assert_invariant(quantity.0 > rust_decimal::Decimal::ZERO, "flatten quantity must be positive")?;
        self.ledger
            .flatten_position(
                &mut self.execution,
                &self.portfolio,
                order_id,
                exit_side,
                symbol,
                quantity,
                position_id,
                self.trader_id.clone(),
                self.strategy_id.clone(),
            )
            .map_err(EngineError::from)
    }

    pub fn flatten_all_positions(&mut self) {
        let strategy_id = self.strategy_id.clone();
        let trader_id = self.trader_id.clone();
        let order_ids = &mut self.order_ids;
        self.ledger.flatten_all_positions(&mut self.execution, &self.portfolio, &strategy_id, trader_id, || {
            order_ids.generate()
        });
    }

    pub fn collateral_inquiry(&mut self) {
        self.ledger.collateral_inquiry(&mut self.execution);
    }

    pub fn handle_bar(&mut self, bar_type: BarType, bar: Bar) {
        self.market_data.handle_bar(bar_type.clone(), bar.clone());
        self.indicators.update_for_bar(&bar_type, &bar);
    }
}

/// Pairs [`EngineCore`] with the user's [`Strategy`] implementation and drives the lifecycle
/// transitions between `start`/`stop`/`reset`/`dispose`.
pub struct StrategyHost<S, E, D, P> {
    pub core: EngineCore<E, D, P>,
    pub strategy: S,
}

impl<S, E, D, P> StrategyHost<S, E, D, P>
where
    S: Strategy<E, D, P>,
    E: ExecutionClient,
    D: DataClient,
    P: Portfolio,
{
    pub fn new(core: EngineCore<E, D, P>, strategy: S) -> Self {
        Self { core, strategy }
    }

    /// Sets `running=true` then calls `on_start`.
    pub fn start(&mut self) {
        self.core.state = HostState::Running;
        invoke_hook("on_start", || self.strategy.on_start(&mut self.core));
    }

    /// Cancels all timers/alerts; flattens if configured and not flat; cancels all active orders
    /// if configured; sets `running=false`; warns on every residual ledger item; calls `on_stop`.
    /// Each step runs regardless of a prior step's partial failure.
    pub fn stop(&mut self) {
        self.core.clock.borrow_mut().cancel_all_timers();
        self.core.clock.borrow_mut().cancel_all_time_alerts();

        if self.core.config.flatten_on_stop && !self.core.portfolio.is_strategy_flat(&self.core.strategy_id) {
            self.core.flatten_all_positions();
        }

        if self.core.config.cancel_all_orders_on_stop {
            self.core.cancel_all_orders("strategy stop");
        }

        self.core.state = HostState::Stopped;

        for order_id in self.core.ledger.residual_order_ids() {
            warn!(%order_id, "residual order left in ledger at stop");
        }
        for order_id in self.core.ledger.residual_atomic_parent_ids() {
            warn!(%order_id, "residual atomic parent left in ledger at stop");
        }
        for order_id in self.core.ledger.residual_modify_order_ids() {
            warn!(%order_id, "residual buffered modify left in ledger at stop");
        }

        invoke_hook("on_stop", || self.strategy.on_stop(&mut self.core));
    }

    /// Refuses when `running=true`; otherwise clears the tick/bar cache, resets every indicator,
    /// resets identifier generators and the ledger, then calls `on_reset`.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        if self.core.state == HostState::Running {
            return Err(EngineError::Precondition("cannot reset while running".to_string()));
        }
        self.core.market_data.reset();
        self.core.indicators.reset_all();
        self.core.ledger.reset();
        self.core.order_ids.reset();
        self.core.position_ids.reset();
        self.core.invalidate_account_cache();

        invoke_hook("on_reset", || self.strategy.on_reset(&mut self.core));
        Ok(())
    }

    /// Calls `on_dispose` (errors logged, not raised) and transitions to `Disposed`. Releasing
    /// external-client references is the caller's responsibility once this returns, since `E`/`D`
    /// are owned by `EngineCore` and dropped along with it.
    pub fn dispose(&mut self) {
        invoke_hook("on_dispose", || self.strategy.on_dispose(&mut self.core));
        self.core.state = HostState::Disposed;
    }

    pub fn on_save(&mut self) -> HashMap<String, Value> {
        self.strategy.on_save(&mut self.core)
    }

    pub fn on_load(&mut self, state: HashMap<String, Value>) {
        self.strategy.on_load(&mut self.core, state);
    }
}

/// Runs a user hook, catching any panic so a strategy bug never takes down the runtime. Rust has no catchable exceptions for ordinary calls, so
/// `catch_unwind` is the idiomatic substitute for "exceptions thrown by a hook are caught, logged,
/// and do not propagate".
pub(crate) fn invoke_hook(name: &'static str, hook: impl FnOnce()) {
    if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(hook)) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(hook = name, %message, "user hook panicked; engine continues in prior lifecycle state");
    }
}
