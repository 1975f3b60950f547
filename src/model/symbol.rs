//! Opaque instrument key and the bar specification that, together, key the bar cache and
//! indicator registry.

use serde::{Deserialize, Serialize};

/// Opaque instrument key: equality is by value of `(code, venue)`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub code: String,
    pub venue: String,
}

impl Symbol {
    pub fn new(code: impl Into<String>, venue: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            venue: venue.into(),
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.code, self.venue)
    }
}

/// Bar aggregation method: how trades/quotes roll up into a [`BarSpecification`] interval.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum BarAggregation {
    Second,
    Minute,
    Hour,
    Day,
}

/// Which side of the market a bar's OHLC values are sourced from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum PriceType {
    Bid,
    Ask,
    Mid,
    Last,
}

/// A bar interval specification, eg/ "5 Minute Mid" bars.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct BarSpecification {
    pub step: u32,
    pub aggregation: BarAggregation,
    pub price_type: PriceType,
}

impl BarSpecification {
    pub fn new(step: u32, aggregation: BarAggregation, price_type: PriceType) -> Self {
        Self { step, aggregation, price_type }
    }
}

/// `(Symbol, BarSpecification)` pair that keys bar streams and indicator bindings.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct BarType {
    pub symbol: Symbol,
    pub specification: BarSpecification,
}

impl BarType {
    pub fn new(symbol: Symbol, specification: BarSpecification) -> Self {
        Self { symbol, specification }
    }
}

impl std::fmt::Display for BarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:?}", self.symbol, self.specification)
    }
}
