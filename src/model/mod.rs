//! Core data model: instruments, market data, orders, positions and the tagged-union
//! [`Event`](event::Event) that flows through the dispatcher.

pub mod bar;
pub mod event;
pub mod instrument;
pub mod order;
pub mod position;
pub mod price;
pub mod symbol;
pub mod tick;

pub use bar::{Bar, BarError};
pub use event::{AccountEvent, Event, PositionEventKind};
pub use instrument::{Currency, Instrument, SecurityType};
pub use order::{AtomicOrder, Order, OrderPurpose, OrderSide, TimeInForce};
pub use position::{MarketPosition, Position};
pub use price::{Price, Quantity};
pub use symbol::{BarAggregation, BarSpecification, BarType, PriceType, Symbol};
pub use tick::{Tick, TickError};
