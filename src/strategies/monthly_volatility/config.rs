//! Monthly rotation parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRotationConfig {
    /// Number of top-ranked symbols to hold each month (default: 10)
    pub stock_count: usize,

    /// Capital allocated per selected symbol; buy size is this divided by
    /// the quoted price, rounded down (default: 1,000,000)
    pub capital_per_stock: f64,

    /// Factor table to rank by at rebalance. When unset, ranking falls back
    /// to the amplitude factor computed from daily bars.
    #[serde(default)]
    pub factor_code: Option<String>,

    /// Daily bars used by the amplitude fallback (default: 20)
    #[serde(default = "default_volatility_lookback")]
    pub volatility_lookback: usize,

    /// Fill price used when no quote is available (default: 29.6)
    #[serde(default = "default_price")]
    pub default_price: f64,

    /// Fill size used when no quote is available (default: 10)
    #[serde(default = "default_volume")]
    pub default_volume: f64,

    /// Historical periods requested from the engine before live evaluation
    /// (default: 1)
    #[serde(default = "default_warmup_bars")]
    pub warmup_bars: usize,
}

fn default_volatility_lookback() -> usize {
    20
}

fn default_price() -> f64 {
    29.6
}

fn default_volume() -> f64 {
    10.0
}

fn default_warmup_bars() -> usize {
    1
}

impl Default for MonthlyRotationConfig {
    fn default() -> Self {
        Self {
            stock_count: 10,
            capital_per_stock: 1_000_000.0,
            factor_code: None,
            volatility_lookback: default_volatility_lookback(),
            default_price: default_price(),
            default_volume: default_volume(),
            warmup_bars: default_warmup_bars(),
        }
    }
}

impl MonthlyRotationConfig {
    /// Reject malformed parameters at construction, not mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.stock_count == 0 {
            return Err(RotationError::Config(
                "stock_count must be greater than 0".into(),
            ));
        }
        if self.capital_per_stock <= 0.0 {
            return Err(RotationError::Config(
                "capital_per_stock must be greater than 0".into(),
            ));
        }
        if self.volatility_lookback == 0 {
            return Err(RotationError::Config(
                "volatility_lookback must be greater than 0".into(),
            ));
        }
        if self.default_price <= 0.0 || self.default_volume <= 0.0 {
            return Err(RotationError::Config(
                "default price and volume must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
