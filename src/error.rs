//! Top-level error aggregation: every module error enum folds into [`EngineError`] via
//! `#[from]`, and each variant maps onto one of the five error kinds the design calls out.

use crate::clock::ClockError;
use crate::ledger::LedgerError;
use crate::market_data::MarketDataError;
use crate::model::order::OrderError;
use crate::model::{BarError, TickError};
use thiserror::Error;

/// The five error kinds at the API boundary. Variants that wrap a module error classify it by the kind
/// it represents at the API boundary, rather than by its originating module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Invalid argument at an API boundary (empty string, negative capacity, unknown key).
    /// Reported to the caller; never silently dropped.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Absence of a key in a ledger/cache (unknown bar type, unknown order id). Reported to the
    /// caller.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// Operation requires a data or execution client not yet registered: logged at error level,
    /// operation suppressed, engine continues.
    #[error("required collaborator not registered: {0}")]
    NotRegistered(String),

    /// An exception escaping a user hook: caught, logged with its payload, engine continues and
    /// remains in its prior lifecycle state. Surfaced here only for callers that want to observe
    /// it programmatically; `invoke_hook` itself only logs.
    #[error("user hook failed: {0}")]
    UserHookFailure(String),

    /// Internal error that should never occur; must abort in debug builds, log and continue in
    /// release.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        EngineError::Lookup(err.to_string())
    }
}

impl From<MarketDataError> for EngineError {
    fn from(err: MarketDataError) -> Self {
        EngineError::Lookup(err.to_string())
    }
}

impl From<ClockError> for EngineError {
    fn from(err: ClockError) -> Self {
        EngineError::Precondition(err.to_string())
    }
}

impl From<OrderError> for EngineError {
    fn from(err: OrderError) -> Self {
        EngineError::Precondition(err.to_string())
    }
}

impl From<TickError> for EngineError {
    fn from(err: TickError) -> Self {
        EngineError::Precondition(err.to_string())
    }
}

impl From<BarError> for EngineError {
    fn from(err: BarError) -> Self {
        EngineError::Precondition(err.to_string())
    }
}

/// Asserts an internal invariant. In debug builds this panics (caught by
/// [`crate::host::invoke_hook`]'s `catch_unwind` if invoked from within a hook); in release
/// builds it logs and returns an [`EngineError::InvariantViolation`] for the caller to handle.
pub fn assert_invariant(condition: bool, message: impl Into<String>) -> Result<(), EngineError> {
    if condition {
        return Ok(());
    }
    let message = message.into();
    if cfg!(debug_assertions) {
        panic!("invariant violated: {message}");
    }
    tracing::error!(%message, "invariant violated");
    Err(EngineError::InvariantViolation(message))
}
