//! Strategy implementations and their common lifecycle.
//!
//! The template-with-callback-hooks shape of the source strategies is
//! expressed as a trait the engine can hold behind `Box<dyn Strategy>`:
//! explicit lifecycle methods, bar delivery, intents returned to the caller.

pub mod momentum;
pub mod monthly_volatility;

use crate::error::Result;
use crate::types::{Bar, TradeIntent};

/// Lifecycle and bar-delivery contract between the engine and a strategy.
///
/// The engine calls `initialize` once, pre-feeds `warmup_bars()` historical
/// periods, then delivers bars one at a time (or one time-aligned batch per
/// period). Each call runs to completion before the next; strategies keep
/// all per-symbol state private.
pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Number of historical periods the engine should pre-feed before live
    /// evaluation begins.
    fn warmup_bars(&self) -> usize {
        0
    }

    /// Reset run-scoped state. Called once before any bar is delivered.
    fn initialize(&mut self);

    /// Evaluate one bar for one symbol.
    fn on_bar(&mut self, bar: &Bar) -> Result<Vec<TradeIntent>>;

    /// Evaluate one time-aligned batch of bars across symbols. The default
    /// folds `on_bar` over the batch in delivery order.
    fn on_bars(&mut self, bars: &[Bar]) -> Result<Vec<TradeIntent>> {
        let mut intents = Vec::new();
        for bar in bars {
            intents.extend(self.on_bar(bar)?);
        }
        Ok(intents)
    }
}
