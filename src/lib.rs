//! Rotation Strategies
//!
//! Intraday bar aggregation and rule-based multi-symbol rotation logic:
//! a minute-to-coarse bar aggregator, an intraday momentum candidate
//! selector with daily position quotas, and a calendar-driven monthly
//! rotation policy. Order execution, persistence, and statistics stay with
//! the external engine; this crate only consumes bars and emits intents.

pub mod aggregator;
pub mod calendar;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod replay;
pub mod strategies;
pub mod types;

pub use error::{Result, RotationError};
pub use types::{Bar, Interval, Symbol, TradeIntent};
