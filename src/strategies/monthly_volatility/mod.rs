//! Monthly rotation: liquidate at month end, re-select a ranked top-N at
//! month start, with month boundaries defined by the trading calendar.

mod config;
mod strategy;

pub use config::MonthlyRotationConfig;
pub use strategy::MonthlyRotationStrategy;
