//! Indicator registry: binds `(bar_type -> [indicator, updater])` pairs and tracks
//! initialization.

use crate::model::{Bar, BarType};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Capability every indicator exposes: update on a new bar, reset, and report whether it has
/// seen enough bars to be trusted (glossary: Indicator).
pub trait Indicator: std::fmt::Debug {
    fn update(&mut self, bar: &Bar);
    fn reset(&mut self);
    fn initialized(&self) -> bool;
}

type IndicatorHandle = Rc<RefCell<dyn Indicator>>;
type UpdateFn = Box<dyn FnMut(&IndicatorHandle, &Bar)>;

/// Binds a strategy-chosen update method to a bar type. The default update simply forwards to
/// [`Indicator::update`]; strategies that need to feed a derived value (eg/ update on bar.high
/// instead of bar.close) supply their own `update` closure via
/// [`IndicatorRegistry::register_indicator_with`].
struct IndicatorBinding {
    indicator: IndicatorHandle,
    update: UpdateFn,
}

impl std::fmt::Debug for IndicatorBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorBinding").field("indicator", &self.indicator).finish()
    }
}

/// Maps `BarType -> ordered sequence of (Indicator, UpdateFn) pairs`.
#[derive(Debug, Default)]
pub struct IndicatorRegistry {
    bindings: HashMap<BarType, Vec<IndicatorBinding>>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `indicator` against `bar_type` using the default update (forwards the bar
    /// straight to [`Indicator::update`]). Appends; does not replace existing bindings.
    pub fn register_indicator(&mut self, bar_type: BarType, indicator: IndicatorHandle) {
        self.register_indicator_with(bar_type, indicator, |handle, bar| {
            handle.borrow_mut().update(bar);
        });
    }

    /// Registers `indicator` against `bar_type` with a custom update closure.
    pub fn register_indicator_with(
        &mut self,
        bar_type: BarType,
        indicator: IndicatorHandle,
        update: impl FnMut(&IndicatorHandle, &Bar) + 'static,
    ) {
        self.bindings
            .entry(bar_type)
            .or_default()
            .push(IndicatorBinding { indicator, update: Box::new(update) });
    }

    /// Returns a copy (cloned `Rc` handles) of every indicator bound to `bar_type`.
    pub fn indicators(&self, bar_type: &BarType) -> Vec<IndicatorHandle> {
        self.bindings
            .get(bar_type)
            .map(|bindings| bindings.iter().map(|b| b.indicator.clone()).collect())
            .unwrap_or_default()
    }

    /// Feeds `bar` to every indicator bound to `bar_type`, via each binding's update closure.
    /// Called by the dispatcher before `on_bar` so indicators read the latest bar.
    pub fn update_for_bar(&mut self, bar_type: &BarType, bar: &Bar) {
        if let Some(bindings) = self.bindings.get_mut(bar_type) {
            for binding in bindings.iter_mut() {
                (binding.update)(&binding.indicator, bar);
            }
        }
    }

    /// True iff every indicator bound to `bar_type` reports `initialized` (and at least one is
    /// bound).
    pub fn indicators_initialized(&self, bar_type: &BarType) -> bool {
        match self.bindings.get(bar_type) {
            Some(bindings) if !bindings.is_empty() => {
                bindings.iter().all(|b| b.indicator.borrow().initialized())
            }
            _ => false,
        }
    }

    /// Folds [`Self::indicators_initialized`] across every registered bar type.
    pub fn indicators_initialized_all(&self) -> bool {
        if self.bindings.is_empty() {
            return false;
        }
        self.bindings.keys().all(|bar_type| self.indicators_initialized(bar_type))
    }

    /// Resets every indicator bound to any bar type. A full reset cascades through both the
    /// indicator state and any update-closure-captured state; this registry's update closures are
    /// stateless by design (they only read the bar and call into the indicator), so there is no
    /// separate updater bar-count left stale after a reset.
    pub fn reset_all(&mut self) {
        for bindings in self.bindings.values_mut() {
            for binding in bindings.iter_mut() {
                binding.indicator.borrow_mut().reset();
            }
        }
    }
}
