//! Strategy trait: a capability set of override hooks,
//! not a class hierarchy. The engine holds a handle to the user's implementation and invokes
//! hooks through this interface only while RUNNING.

use crate::host::EngineCore;
use crate::model::{Bar, BarType, Event, Instrument, Symbol, Tick};
use serde_json::Value;
use std::collections::HashMap;

/// User-defined trading logic. Every method has a default no-op body; strategies override only
/// the hooks they need. `Core` is the engine-side state the strategy is given access to for the
/// duration of each call (market-data cache, indicator registry, ledger, clock, identifiers) —
/// see [`EngineCore`].
pub trait Strategy<E, D, P> {
    fn on_start(&mut self, _core: &mut EngineCore<E, D, P>) {}

    fn on_tick(&mut self, _core: &mut EngineCore<E, D, P>, _tick: &Tick) {}

    fn on_bar(&mut self, _core: &mut EngineCore<E, D, P>, _bar_type: &BarType, _bar: &Bar) {}

    fn on_instrument(&mut self, _core: &mut EngineCore<E, D, P>, _instrument: &Instrument) {}

    fn on_event(&mut self, _core: &mut EngineCore<E, D, P>, _event: &Event) {}

    fn on_stop(&mut self, _core: &mut EngineCore<E, D, P>) {}

    fn on_reset(&mut self, _core: &mut EngineCore<E, D, P>) {}

    /// Returns opaque state to persist. Format is strategy-defined; the engine guarantees to
    /// round-trip whatever is returned here through [`Strategy::on_load`].
    fn on_save(&mut self, _core: &mut EngineCore<E, D, P>) -> HashMap<String, Value> {
        HashMap::new()
    }

    fn on_load(&mut self, _core: &mut EngineCore<E, D, P>, _state: HashMap<String, Value>) {}

    fn on_dispose(&mut self, _core: &mut EngineCore<E, D, P>) {}
}

/// Returns the data client's known symbols rather than actual `Instrument` objects, preserved
/// verbatim from the upstream `instruments()` accessor's observable behavior, which callers have
/// likely come to depend on even though the name now suggests otherwise.
pub fn instruments_bug_preserving_accessor(data_client_symbols: Vec<Symbol>) -> Vec<Symbol> {
    data_client_symbols
}
