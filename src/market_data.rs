//! Market-data cache: last tick per symbol, bounded bar history per bar type.

use crate::model::{Bar, BarType, Symbol, Tick};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    #[error("no tick cached for symbol {0}")]
    UnknownSymbol(Symbol),
    #[error("no bars cached for bar type {0}")]
    UnknownBarType(BarType),
    #[error("bar index {index} out of range for bar type {bar_type} (have {len})")]
    IndexOutOfRange { bar_type: BarType, index: usize, len: usize },
}

/// Holds `last_tick: Symbol -> Tick` (most-recent wins) and `bars: BarType -> bounded ordered
/// sequence of Bar` (index 0 = newest).
#[derive(Debug)]
pub struct MarketDataCache {
    last_tick: HashMap<Symbol, Tick>,
    bars: HashMap<BarType, VecDeque<Bar>>,
    bar_capacity: usize,
}

impl MarketDataCache {
    pub fn new(bar_capacity: usize) -> Self {
        Self {
            last_tick: HashMap::new(),
            bars: HashMap::new(),
            bar_capacity,
        }
    }

    /// Sets `last_tick[tick.symbol] = tick`.
    pub fn handle_tick(&mut self, tick: Tick) {
        self.last_tick.insert(tick.symbol.clone(), tick);
    }

    pub fn last_tick(&self, symbol: &Symbol) -> Result<&Tick, MarketDataError> {
        self.last_tick.get(symbol).ok_or_else(|| MarketDataError::UnknownSymbol(symbol.clone()))
    }

    /// Appends `bar` to the front of `bars[bar_type]` (creating a bounded deque of capacity
    /// `bar_capacity` on first use), evicting the oldest entry once over capacity.
    pub fn handle_bar(&mut self, bar_type: BarType, bar: Bar) {
        let deque = self.bars.entry(bar_type).or_insert_with(|| VecDeque::with_capacity(self.bar_capacity));
        deque.push_front(bar);
        while deque.len() > self.bar_capacity {
            deque.pop_back();
        }
    }

    pub fn last_bar(&self, bar_type: &BarType) -> Result<&Bar, MarketDataError> {
        self.bars
            .get(bar_type)
            .and_then(|deque| deque.front())
            .ok_or_else(|| MarketDataError::UnknownBarType(bar_type.clone()))
    }

    /// Reverse-indexed lookup: `index = 0` is the newest bar.
    pub fn bar(&self, bar_type: &BarType, index: usize) -> Result<&Bar, MarketDataError> {
        let deque = self.bars.get(bar_type).ok_or_else(|| MarketDataError::UnknownBarType(bar_type.clone()))?;
        deque.get(index).ok_or_else(|| MarketDataError::IndexOutOfRange {
            bar_type: bar_type.clone(),
            index,
            len: deque.len(),
        })
    }

    /// A stable snapshot copy of the bars cached for `bar_type`, newest-first.
    pub fn bars(&self, bar_type: &BarType) -> Result<Vec<Bar>, MarketDataError> {
        self.bars
            .get(bar_type)
            .map(|deque| deque.iter().cloned().collect())
            .ok_or_else(|| MarketDataError::UnknownBarType(bar_type.clone()))
    }

    pub fn bar_capacity(&self) -> usize {
        self.bar_capacity
    }

    /// Clears every cached tick and bar. Called by `reset()`.
    pub fn reset(&mut self) {
        self.last_tick.clear();
        self.bars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BarAggregation, BarSpecification, Price, PriceType, Quantity};
    use rust_decimal_macros::dec;

    fn bar_type() -> BarType {
        BarType::new(
            Symbol::new("EURUSD", "SIM"),
            BarSpecification::new(1, BarAggregation::Minute, PriceType::Mid),
        )
    }

    fn bar(close: i64) -> Bar {
        Bar::new(
            Price(dec!(1.1)),
            Price(dec!(1.2)),
            Price(dec!(1.05)),
            Price(rust_decimal::Decimal::from(close)),
            Quantity(dec!(100)),
            chrono::Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn bar_capacity_evicts_oldest_bar() {
        let mut cache = MarketDataCache::new(3);
        let bt = bar_type();
        cache.handle_bar(bt.clone(), bar(1));
        cache.handle_bar(bt.clone(), bar(2));
        cache.handle_bar(bt.clone(), bar(3));
        cache.handle_bar(bt.clone(), bar(4));

        let bars = cache.bars(&bt).unwrap();
        assert_eq!(bars.iter().map(|b| b.close.0.to_string()).collect::<Vec<_>>(), vec!["4", "3", "2"]);
        assert_eq!(cache.last_bar(&bt).unwrap().close.0.to_string(), "4");
    }

    #[test]
    fn reverse_indexed_bar_lookup() {
        let mut cache = MarketDataCache::new(5);
        let bt = bar_type();
        cache.handle_bar(bt.clone(), bar(1));
        cache.handle_bar(bt.clone(), bar(2));

        assert_eq!(cache.bar(&bt, 0).unwrap().close.0.to_string(), "2");
        assert_eq!(cache.bar(&bt, 1).unwrap().close.0.to_string(), "1");
        assert!(matches!(cache.bar(&bt, 2), Err(MarketDataError::IndexOutOfRange { .. })));
    }

    #[test]
    fn unknown_symbol_is_a_lookup_error() {
        let cache = MarketDataCache::new(5);
        assert!(matches!(
            cache.last_tick(&Symbol::new("GBPUSD", "SIM")),
            Err(MarketDataError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn reset_clears_ticks_and_bars() {
        let mut cache = MarketDataCache::new(5);
        let bt = bar_type();
        cache.handle_bar(bt.clone(), bar(1));
        cache.reset();
        assert!(cache.bars(&bt).is_err());
    }
}
