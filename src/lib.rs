//! Strategy Engine: the core runtime that hosts user-defined trading strategies and mediates
//! every interaction with market-data, execution, portfolio, and clock collaborators.
//!
//! The engine is single-threaded and cooperative: all engine-visible mutation happens on
//! the one logical thread that drives [`dispatcher`]. It never suspends, takes no locks, and is
//! not re-entrancy-safe for concurrent mutation of its ledger or caches — callers marshal
//! external callbacks onto that single thread themselves.

pub mod clients;
pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod exchange_rate;
pub mod host;
pub mod identifiers;
pub mod indicator;
pub mod ledger;
pub mod market_data;
pub mod model;
pub mod strategy;

pub use clients::{Account, DataClient, ExecutionClient, ExecutionCommand, Portfolio};
pub use clock::{Clock, ClockError, ClockHandler, LiveClock, TestClock, TimeEvent};
pub use error::EngineError;
pub use host::{EngineCore, HostState, StrategyConfig, StrategyHost};
pub use identifiers::{IdGenerator, OrderId, OrderIdGenerator, PositionId, PositionIdGenerator, StrategyId, TraderId};
pub use indicator::{Indicator, IndicatorRegistry};
pub use ledger::{LedgerError, OrderLedger};
pub use market_data::{MarketDataCache, MarketDataError};
pub use strategy::Strategy;
