//! Momentum rotation parameters.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RotationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumRotationConfig {
    /// Maximum symbols bought per trading day (default: 5)
    pub max_positions: usize,

    /// Lower bound of the qualifying percent-change band, inclusive
    /// (default: 0.095)
    pub buy_threshold_min: f64,

    /// Upper bound of the qualifying percent-change band, inclusive
    /// (default: 0.099)
    pub buy_threshold_max: f64,

    /// Shares per buy intent (default: 100)
    pub fixed_size: f64,

    /// Start of the intraday decision window (default: 13:00)
    #[serde(default = "default_window_start")]
    pub window_start: NaiveTime,

    /// End of the decision window; the bar at exactly this time is the
    /// session-end decision point (default: 15:00)
    #[serde(default = "default_window_end")]
    pub window_end: NaiveTime,

    /// Historical periods requested from the engine before live evaluation
    /// (default: 100)
    #[serde(default = "default_warmup_bars")]
    pub warmup_bars: usize,
}

fn default_window_start() -> NaiveTime {
    NaiveTime::from_hms_opt(13, 0, 0).expect("13:00 is a valid time")
}

fn default_window_end() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).expect("15:00 is a valid time")
}

fn default_warmup_bars() -> usize {
    100
}

impl Default for MomentumRotationConfig {
    fn default() -> Self {
        Self {
            max_positions: 5,
            buy_threshold_min: 0.095,
            buy_threshold_max: 0.099,
            fixed_size: 100.0,
            window_start: default_window_start(),
            window_end: default_window_end(),
            warmup_bars: default_warmup_bars(),
        }
    }
}

impl MomentumRotationConfig {
    /// Reject malformed parameters at construction, not mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.max_positions == 0 {
            return Err(RotationError::Config(
                "max_positions must be greater than 0".into(),
            ));
        }
        if self.buy_threshold_min > self.buy_threshold_max {
            return Err(RotationError::Config(format!(
                "buy threshold band is inverted: min {} > max {}",
                self.buy_threshold_min, self.buy_threshold_max
            )));
        }
        if self.fixed_size <= 0.0 {
            return Err(RotationError::Config(
                "fixed_size must be greater than 0".into(),
            ));
        }
        if self.window_start > self.window_end {
            return Err(RotationError::Config(format!(
                "decision window is inverted: {} > {}",
                self.window_start, self.window_end
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MomentumRotationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_max_positions_rejected() {
        let config = MomentumRotationConfig {
            max_positions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_band_rejected() {
        let config = MomentumRotationConfig {
            buy_threshold_min: 0.10,
            buy_threshold_max: 0.09,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
