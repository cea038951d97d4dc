//! Candidate selection and daily rotation.
//!
//! Within the intraday decision window, each bar whose average price sits in
//! the configured band over yesterday's close joins the candidate list. When
//! the list reaches the position cap, or the session-end bar arrives,
//! candidates are ranked by price (descending, stable) and converted into
//! buy intents up to the day's remaining quota.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::MomentumRotationConfig;
use crate::error::{Result, RotationError};
use crate::strategies::Strategy;
use crate::types::{Bar, Symbol, TradeIntent};

/// A symbol that passed the threshold test but is not yet confirmed bought.
#[derive(Debug, Clone)]
struct Candidate {
    symbol: Symbol,
    price: f64,
    pct_change: f64,
}

pub struct MomentumRotationStrategy {
    config: MomentumRotationConfig,
    /// Last bar seen per symbol, for session rollover detection
    last_bars: HashMap<Symbol, Bar>,
    /// Previous session's closing price per symbol
    yesterday_close: HashMap<Symbol, f64>,
    /// Symbols bought per trading date; ordered map keeps reporting and
    /// iteration deterministic across runs
    bought_by_date: BTreeMap<NaiveDate, Vec<Symbol>>,
    /// Qualifying candidates of the current decision window
    candidates: Vec<Candidate>,
}

impl MomentumRotationStrategy {
    pub fn new(config: MomentumRotationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            last_bars: HashMap::new(),
            yesterday_close: HashMap::new(),
            bought_by_date: BTreeMap::new(),
            candidates: Vec::new(),
        })
    }

    pub fn config(&self) -> &MomentumRotationConfig {
        &self.config
    }

    /// Symbols bought on a given trading date, in buy order.
    pub fn bought_on(&self, date: NaiveDate) -> &[Symbol] {
        self.bought_by_date
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn check_stream_order(&self, bar: &Bar) -> Result<()> {
        if let Some(last) = self.last_bars.get(&bar.symbol) {
            if bar.datetime < last.datetime {
                return Err(RotationError::OutOfOrderBar {
                    symbol: bar.symbol.clone(),
                    datetime: bar.datetime,
                    last_seen: last.datetime,
                });
            }
        }
        Ok(())
    }

    /// Rank candidates and convert the top of the list into buy intents,
    /// bounded by the date's remaining quota. Clears the candidate list
    /// regardless of how many were bought.
    fn decide(&mut self, date: NaiveDate, bar: &Bar) -> Vec<TradeIntent> {
        // Stable sort: ties on price keep their arrival order
        self.candidates.sort_by(|a, b| {
            b.price
                .partial_cmp(&a.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut intents = Vec::new();
        let bought = self.bought_by_date.entry(date).or_default();

        for candidate in self.candidates.iter().take(self.config.max_positions) {
            if bought.len() >= self.config.max_positions {
                break;
            }
            // A symbol can queue twice before the decision point fires;
            // only the first entry buys
            if bought.contains(&candidate.symbol) {
                continue;
            }
            intents.push(TradeIntent::buy(
                candidate.symbol.clone(),
                candidate.price,
                self.config.fixed_size,
                bar.datetime,
            ));
            bought.push(candidate.symbol.clone());
            info!(
                symbol = %candidate.symbol,
                price = candidate.price,
                size = self.config.fixed_size,
                pct_change = format!("{:.2}%", candidate.pct_change * 100.0),
                "buying candidate"
            );
        }

        self.candidates.clear();
        intents
    }
}

impl Strategy for MomentumRotationStrategy {
    fn name(&self) -> &'static str {
        "momentum_rotation"
    }

    fn warmup_bars(&self) -> usize {
        self.config.warmup_bars
    }

    fn initialize(&mut self) {
        info!(strategy = self.name(), "initializing");
        self.last_bars.clear();
        self.yesterday_close.clear();
        self.bought_by_date.clear();
        self.candidates.clear();
    }

    fn on_bar(&mut self, bar: &Bar) -> Result<Vec<TradeIntent>> {
        self.check_stream_order(bar)?;

        let date = bar.datetime.date_naive();
        let time = bar.datetime.time();

        // Session rollover: record the previous session's close and reset
        // the decision window
        if let Some(last) = self.last_bars.get(&bar.symbol) {
            if last.datetime.date_naive() != date {
                self.yesterday_close.insert(bar.symbol.clone(), last.close);
                self.candidates.clear();
            }
        }

        // Only evaluate inside the decision window
        if time < self.config.window_start || time > self.config.window_end {
            self.last_bars.insert(bar.symbol.clone(), bar.clone());
            return Ok(Vec::new());
        }

        // Daily quota already exhausted: nothing further today
        let bought_count = self.bought_by_date.get(&date).map_or(0, Vec::len);
        if bought_count >= self.config.max_positions {
            return Ok(Vec::new());
        }

        // No baseline close yet: record the bar and move on
        let Some(&prev_close) = self.yesterday_close.get(&bar.symbol) else {
            self.last_bars.insert(bar.symbol.clone(), bar.clone());
            return Ok(Vec::new());
        };

        let avg_price = bar.average_price();
        let pct_change = (avg_price - prev_close) / prev_close;
        debug!(
            symbol = %bar.symbol,
            %date,
            %time,
            avg_price,
            prev_close,
            pct_change,
            "evaluating bar"
        );

        let already_bought = self
            .bought_by_date
            .get(&date)
            .is_some_and(|bought| bought.contains(&bar.symbol));

        if pct_change >= self.config.buy_threshold_min
            && pct_change <= self.config.buy_threshold_max
            && !already_bought
        {
            self.candidates.push(Candidate {
                symbol: bar.symbol.clone(),
                price: avg_price,
                pct_change,
            });
            info!(symbol = %bar.symbol, pct_change, "qualifying candidate");
        }

        // Decision point: quota-sized candidate list, or the session-end bar
        let intents = if self.candidates.len() >= self.config.max_positions
            || time == self.config.window_end
        {
            self.decide(date, bar)
        } else {
            Vec::new()
        };

        self.last_bars.insert(bar.symbol.clone(), bar.clone());
        Ok(intents)
    }
}
