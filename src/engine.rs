//! Seams toward the external engine.
//!
//! The strategies never own data access or order execution. Multi-day
//! lookups and factor rankings come through these traits, injected at
//! strategy construction, so backtest and live wiring can differ without
//! touching the policies. Lookup failures use `anyhow` so call sites can
//! log and degrade instead of aborting a multi-year run.

use anyhow::Result;
use chrono::NaiveDate;

use crate::types::{Bar, Interval, Symbol};

/// On-demand historical and quote lookups.
pub trait MarketData {
    /// Most recent `count` bars of the given interval for a symbol,
    /// chronological order.
    fn get_bars(&self, symbol: &Symbol, interval: Interval, count: usize) -> Result<Vec<Bar>>;

    /// Latest tradable price for a symbol.
    fn get_price(&self, symbol: &Symbol) -> Result<f64>;
}

/// One row of a factor ranking table.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorScore {
    pub symbol: Symbol,
    pub value: f64,
}

/// Externally computed factor tables keyed by factor code and trade date.
pub trait FactorProvider {
    fn factor_scores(&self, factor_code: &str, date: NaiveDate) -> Result<Vec<FactorScore>>;
}
