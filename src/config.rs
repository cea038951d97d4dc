//! Replay configuration files.
//!
//! JSON files describing a replay run: where the data lives, which symbols
//! to load, and which strategy (with parameters) to drive. Numeric
//! constraints are checked when the strategy is constructed, before any bar
//! is delivered.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::strategies::momentum::MomentumRotationConfig;
use crate::strategies::monthly_volatility::MonthlyRotationConfig;
use crate::types::{Interval, Symbol};

/// Top-level replay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Directory holding `{symbol}_{interval}.csv` files
    pub data_dir: String,

    pub symbols: Vec<String>,

    /// Granularity of the input files (default: minute)
    #[serde(default = "default_interval")]
    pub interval: Interval,

    /// Trading calendar file, required by the monthly strategy
    #[serde(default)]
    pub calendar_file: Option<String>,

    pub strategy: StrategyConfig,
}

fn default_interval() -> Interval {
    Interval::Minute
}

/// Strategy selection with its parameters, keyed by name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum StrategyConfig {
    MomentumRotation(MomentumRotationConfig),
    MonthlyVolatility(MonthlyRotationConfig),
}

impl ReplayConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: ReplayConfig =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.symbols.iter().map(Symbol::new).collect()
    }

    pub fn strategy_name(&self) -> &'static str {
        match &self.strategy {
            StrategyConfig::MomentumRotation(_) => "momentum_rotation",
            StrategyConfig::MonthlyVolatility(_) => "monthly_volatility",
        }
    }
}
