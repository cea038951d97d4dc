//! Intraday momentum rotation: accumulate symbols whose gain over
//! yesterday's close sits inside a narrow band, buy the highest-priced few.

mod config;
mod strategy;

pub use config::MomentumRotationConfig;
pub use strategy::MomentumRotationStrategy;
