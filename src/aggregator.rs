//! Coarse bar aggregation.
//!
//! Folds a stream of fine-grained bars into coarser-period bars (minute into
//! daily or monthly), one in-progress accumulator per symbol. Accumulators
//! seal the instant a bar with a new period key arrives; gaps in period keys
//! are not back-filled.

use chrono::{DateTime, Datelike, Utc};

use crate::error::{Result, RotationError};
use crate::types::{Bar, Interval};

/// Period key of a bar under the target granularity.
///
/// (year, month, day) with day zeroed for monthly aggregation, so a simple
/// equality check detects period turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PeriodKey {
    year: i32,
    month: u32,
    day: u32,
}

impl PeriodKey {
    fn of(datetime: DateTime<Utc>, target: Interval) -> Self {
        let date = datetime.date_naive();
        PeriodKey {
            year: date.year(),
            month: date.month(),
            day: if target == Interval::Daily {
                date.day()
            } else {
                0
            },
        }
    }
}

/// One in-progress coarse bar for a single symbol.
#[derive(Debug, Clone)]
struct AggregationState {
    key: PeriodKey,
    bar: Bar,
    last_seen: DateTime<Utc>,
}

impl AggregationState {
    fn open(bar: &Bar, key: PeriodKey, target: Interval) -> Self {
        let mut coarse = bar.clone();
        coarse.interval = target;
        AggregationState {
            key,
            last_seen: bar.datetime,
            bar: coarse,
        }
    }

    /// Fold one more bar of the same period. Open is never modified after
    /// the period opens.
    fn accumulate(&mut self, bar: &Bar) {
        self.bar.high = self.bar.high.max(bar.high);
        self.bar.low = self.bar.low.min(bar.low);
        self.bar.close = bar.close;
        self.bar.volume += bar.volume;
        self.bar.turnover += bar.turnover;
        self.last_seen = bar.datetime;
    }
}

/// Aggregates fine-grained bars into coarse-period bars, per symbol.
#[derive(Debug)]
pub struct BarAggregator {
    target: Interval,
    /// Open accumulators in symbol arrival order, so flush output stays
    /// deterministic for identical input streams.
    open: Vec<AggregationState>,
    sealed: Vec<Bar>,
}

impl BarAggregator {
    /// Create an aggregator targeting `Daily` or `Monthly` bars.
    pub fn new(target: Interval) -> Result<Self> {
        match target {
            Interval::Daily | Interval::Monthly => Ok(BarAggregator {
                target,
                open: Vec::new(),
                sealed: Vec::new(),
            }),
            other => Err(RotationError::Config(format!(
                "aggregation target must be daily or monthly, got {}",
                other
            ))),
        }
    }

    pub fn target(&self) -> Interval {
        self.target
    }

    /// Feed one bar. Bars must be internally consistent and arrive in
    /// non-decreasing timestamp order per symbol; violations are reported,
    /// not tolerated.
    pub fn update(&mut self, bar: &Bar) -> Result<()> {
        bar.validate().map_err(|source| RotationError::InvalidBar {
            symbol: bar.symbol.clone(),
            source,
        })?;

        let key = PeriodKey::of(bar.datetime, self.target);

        match self.open.iter_mut().find(|s| s.bar.symbol == bar.symbol) {
            None => {
                self.open.push(AggregationState::open(bar, key, self.target));
            }
            Some(state) => {
                if bar.datetime < state.last_seen {
                    return Err(RotationError::OutOfOrderBar {
                        symbol: bar.symbol.clone(),
                        datetime: bar.datetime,
                        last_seen: state.last_seen,
                    });
                }
                if state.key != key {
                    let fresh = AggregationState::open(bar, key, self.target);
                    let done = std::mem::replace(state, fresh);
                    self.sealed.push(done.bar);
                } else {
                    state.accumulate(bar);
                }
            }
        }

        Ok(())
    }

    /// Seal all still-open accumulators (the final partial periods) and
    /// drain the emitted sequence in arrival order. A second flush with no
    /// intervening update returns an empty sequence.
    pub fn flush(&mut self) -> Vec<Bar> {
        for state in self.open.drain(..) {
            self.sealed.push(state.bar);
        }
        std::mem::take(&mut self.sealed)
    }
}
