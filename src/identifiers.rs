//! Value-object identifiers and the monotonic, collision-free generators that mint them.
//!
//! OrderId and PositionId are produced by [`IdGenerator`], tagged by trader, strategy and clock
//! time so that uniqueness holds within a trader across both live and backtest time domains.

use crate::clock::Clock;
use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::cell::RefCell;

/// Identifies the trader this strategy instance is running under.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, From, Serialize, Deserialize)]
pub struct TraderId(pub String);

/// Identifies a strategy instance, unique within a [`TraderId`].
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, From, Serialize, Deserialize)]
pub struct StrategyId(pub String);

/// Identifies an [`Order`](crate::model::order::Order).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, From, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Identifies a [`Position`](crate::model::position::Position).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, From, Serialize, Deserialize)]
pub struct PositionId(pub String);

/// Generates identifiers of the form `"{prefix}-{YYYYMMDD}-{HHMMSS}-{trader_tag}-{strategy_tag}-{counter}"`.
///
/// Uniqueness at the trader level is guaranteed by the combination of trader/strategy tags and a
/// monotonic counter within a second, and across seconds by the datetime component.
#[derive(Debug, Constructor)]
pub struct IdGenerator {
    prefix: &'static str,
    trader_tag: String,
    strategy_tag: String,
    clock: Rc<RefCell<dyn Clock>>,
    counter: u64,
}

impl IdGenerator {
    pub fn new_with_counter(
        prefix: &'static str,
        trader_tag: String,
        strategy_tag: String,
        clock: Rc<RefCell<dyn Clock>>,
    ) -> Self {
        Self {
            prefix,
            trader_tag,
            strategy_tag,
            clock,
            counter: 0,
        }
    }

    /// Increments the internal counter and returns the next formatted identifier string.
    pub fn generate(&mut self) -> String {
        self.counter += 1;
        let now = self.clock.borrow().time_now();
        format!(
            "{}-{}-{}-{}-{}-{}",
            self.prefix,
            now.format("%Y%m%d"),
            now.format("%H%M%S"),
            self.trader_tag,
            self.strategy_tag,
            self.counter,
        )
    }

    /// Zeroes the internal counter.
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Rebuilds this generator against a new clock, preserving prefix/tags but resetting the
    /// counter. Used by [`EngineCore::change_clock`](crate::host::EngineCore::change_clock)
    /// backtest reseeding.
    pub fn rebuild(&mut self, clock: Rc<RefCell<dyn Clock>>) {
        self.clock = clock;
        self.counter = 0;
    }
}

/// Generates [`OrderId`]s with prefix `"O"`.
#[derive(Debug)]
pub struct OrderIdGenerator(IdGenerator);

impl OrderIdGenerator {
    pub fn new(trader_tag: String, strategy_tag: String, clock: Rc<RefCell<dyn Clock>>) -> Self {
        Self(IdGenerator::new_with_counter("O", trader_tag, strategy_tag, clock))
    }

    pub fn generate(&mut self) -> OrderId {
        OrderId(self.0.generate())
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }

    pub fn rebuild(&mut self, clock: Rc<RefCell<dyn Clock>>) {
        self.0.rebuild(clock);
    }
}

/// Generates [`PositionId`]s with prefix `"P"`.
#[derive(Debug)]
pub struct PositionIdGenerator(IdGenerator);

impl PositionIdGenerator {
    pub fn new(trader_tag: String, strategy_tag: String, clock: Rc<RefCell<dyn Clock>>) -> Self {
        Self(IdGenerator::new_with_counter("P", trader_tag, strategy_tag, clock))
    }

    pub fn generate(&mut self) -> PositionId {
        PositionId(self.0.generate())
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }

    pub fn rebuild(&mut self, clock: Rc<RefCell<dyn Clock>>) {
        self.0.rebuild(clock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use chrono::TimeZone;

    fn clock_at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> Rc<RefCell<dyn Clock>> {
        let time = chrono::Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap();
        Rc::new(RefCell::new(TestClock::new(time)))
    }

    #[test]
    fn order_id_format_matches_trader_and_strategy_tags() {
        let clock = clock_at(2020, 3, 14, 9, 26, 53);
        let mut gen = OrderIdGenerator::new("000".to_string(), "EMA-001".to_string(), clock);

        assert_eq!(gen.generate(), OrderId("O-20200314-092653-000-EMA-001-1".to_string()));
        assert_eq!(gen.generate(), OrderId("O-20200314-092653-000-EMA-001-2".to_string()));
        assert_eq!(gen.generate(), OrderId("O-20200314-092653-000-EMA-001-3".to_string()));
    }

    #[test]
    fn position_id_uses_p_prefix() {
        let clock = clock_at(2020, 3, 14, 9, 26, 53);
        let mut gen = PositionIdGenerator::new("000".to_string(), "EMA-001".to_string(), clock);
        assert_eq!(gen.generate(), PositionId("P-20200314-092653-000-EMA-001-1".to_string()));
    }

    #[test]
    fn reset_zeroes_counter() {
        let clock = clock_at(2020, 3, 14, 9, 26, 53);
        let mut gen = OrderIdGenerator::new("000".to_string(), "EMA-001".to_string(), clock);
        gen.generate();
        gen.generate();
        gen.reset();
        assert_eq!(gen.generate(), OrderId("O-20200314-092653-000-EMA-001-1".to_string()));
    }

    #[test]
    fn ids_are_pairwise_distinct_and_strictly_increasing() {
        let clock = clock_at(2020, 3, 14, 9, 26, 53);
        let mut gen = OrderIdGenerator::new("000".to_string(), "EMA-001".to_string(), clock);
        let ids: Vec<_> = (0..50).map(|_| gen.generate().0).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len(), "all generated ids must be distinct");
    }
}
