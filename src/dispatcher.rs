//! Event Dispatcher: the sole entry point for external-world input. Implemented as a
//! separate `impl` block on [`StrategyHost`] so lifecycle methods (host.rs) and dispatch methods
//! stay in their own files, separating a trader's lifecycle from its event loop.

use crate::clients::{DataClient, ExecutionClient, Portfolio};
use crate::host::{invoke_hook, StrategyHost};
use crate::model::{Bar, BarType, Event, Tick};
use crate::strategy::Strategy;

impl<S, E, D, P> StrategyHost<S, E, D, P>
where
    S: Strategy<E, D, P>,
    E: ExecutionClient,
    D: DataClient,
    P: Portfolio,
{
    /// `ticks[tick.symbol] = tick`; if running, calls `on_tick`.
    pub fn handle_tick(&mut self, tick: Tick) {
        self.core.market_data.handle_tick(tick.clone());
        if self.core.is_running() {
            invoke_hook("on_tick", || self.strategy.on_tick(&mut self.core, &tick));
        }
    }

    /// Appends into the bar cache (creating a bounded deque of capacity `bar_capacity` on first
    /// use), feeds every updater bound to `bar_type`, then — if running — calls `on_bar`.
    /// Updaters fire before `on_bar` so indicators read the latest bar.
    pub fn handle_bar(&mut self, bar_type: BarType, bar: Bar) {
        self.core.handle_bar(bar_type.clone(), bar.clone());
        if self.core.is_running() {
            invoke_hook("on_bar", || self.strategy.on_bar(&mut self.core, &bar_type, &bar));
        }
    }

    /// Dispatches into the order-event reducer, then — if running — calls `on_event`.
    /// A reducer-triggered flatten (stop-loss rejected with `flatten_on_sl_reject`) is
    /// followed up here, since only the dispatcher knows that config flag.
    pub fn handle_event(&mut self, event: Event) {
        if let Event::AccountEvent(_) = &event {
            self.core.invalidate_account_cache();
        }

        let flatten_target = self.core.ledger.apply_event(
            &mut self.core.execution,
            &self.core.portfolio,
            &event,
            self.core.config.flatten_on_sl_reject,
        );

        if let Some(position_id) = flatten_target {
            if let Some(position) = self.core.portfolio.get_position(&position_id) {
                let exit_side = match position.market_position {
                    crate::model::position::MarketPosition::Long => Some(crate::model::order::OrderSide::Sell),
                    crate::model::position::MarketPosition::Short => Some(crate::model::order::OrderSide::Buy),
                    crate::model::position::MarketPosition::Flat => None,
                };
                if let Some(exit_side) = exit_side {
                    let order_id = self.core.order_ids.generate();
                    let _ = self.core.flatten_position(
                        order_id,
                        exit_side,
                        position.symbol.clone(),
                        position.quantity,
                        position_id,
                    );
                }
            }
        }

        if self.core.is_running() {
            invoke_hook("on_event", || self.strategy.on_event(&mut self.core, &event));
        }
    }
}
