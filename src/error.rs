//! Crate-level error taxonomy.
//!
//! Configuration problems are rejected at construction time; stream problems
//! (missing calendar entries, out-of-order bars) surface during evaluation
//! and must propagate to the engine instead of being swallowed.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::types::{BarValidationError, Symbol};

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The supplied trading calendar does not contain the date being
    /// evaluated. Silent continuation would corrupt rebalance timing, so
    /// this is fatal for the evaluation step.
    #[error("trading date {0} is not in the supplied trading calendar")]
    DateNotInCalendar(NaiveDate),

    /// The calendar ends at (or starts at) the date being queried, so the
    /// adjacent trading day needed for a month-boundary check is unknown.
    #[error("trading calendar has no entry beyond {0}")]
    CalendarExhausted(NaiveDate),

    #[error("bar for {symbol} at {datetime} arrived before last seen bar at {last_seen}")]
    OutOfOrderBar {
        symbol: Symbol,
        datetime: DateTime<Utc>,
        last_seen: DateTime<Utc>,
    },

    #[error("invalid bar for {symbol}: {source}")]
    InvalidBar {
        symbol: Symbol,
        source: BarValidationError,
    },
}

pub type Result<T> = std::result::Result<T, RotationError>;
