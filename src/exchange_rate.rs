//! Exchange-Rate Helper: MID rate between a quote currency and the account's base
//! currency, computed from the per-symbol bid/ask snapshot the engine already caches.
//!
//! The calculator itself is opaque to the engine; this
//! only supplies the per-symbol bid/ask map and the quote/base pair to whatever conversion logic
//! a strategy or portfolio plugs in.

use crate::model::{Currency, Price, Symbol, Tick};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeRateError {
    #[error("no tick snapshot for symbol {0}")]
    NoQuote(Symbol),
}

/// Computes `MID = (bid + ask) / 2` for the symbol pairing `quote` and `base`, reading the
/// current tick snapshot out of `ticks` (typically `MarketDataCache::last_tick` results collected
/// per symbol).
pub fn mid_rate(
    ticks: &HashMap<Symbol, Tick>,
    quote: &Currency,
    base: &Currency,
) -> Result<Price, ExchangeRateError> {
    let symbol = Symbol::new(format!("{quote}{base}"), "FX");
    let tick = ticks.get(&symbol).ok_or_else(|| ExchangeRateError::NoQuote(symbol.clone()))?;
    Ok(tick.mid())
}
