//! Calendar-driven monthly rotation.
//!
//! Bars arrive as time-aligned daily batches. On the last trading day of a
//! month (the day whose next trading day, per the calendar, falls in a
//! different month) every position is liquidated. On the first trading day
//! of a month the universe is re-ranked and the top N are bought. Ranking
//! comes from the injected factor provider when a factor code is configured,
//! otherwise from the amplitude of recent daily bars.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::MonthlyRotationConfig;
use crate::calendar::TradingCalendar;
use crate::engine::{FactorProvider, MarketData};
use crate::error::{Result, RotationError};
use crate::strategies::Strategy;
use crate::types::{Bar, Interval, Symbol, TradeIntent};

pub struct MonthlyRotationStrategy {
    config: MonthlyRotationConfig,
    /// Tradable universe, ranked at every rebalance
    symbols: Vec<Symbol>,
    calendar: TradingCalendar,
    market_data: Box<dyn MarketData>,
    factors: Option<Box<dyn FactorProvider>>,
    /// Timestamp of the last evaluated batch; month-boundary triggers fire
    /// once per trading date
    last_batch: Option<DateTime<Utc>>,
}

impl MonthlyRotationStrategy {
    pub fn new(
        config: MonthlyRotationConfig,
        symbols: Vec<Symbol>,
        calendar: TradingCalendar,
        market_data: Box<dyn MarketData>,
        factors: Option<Box<dyn FactorProvider>>,
    ) -> Result<Self> {
        config.validate()?;
        if calendar.is_empty() {
            return Err(RotationError::Config(
                "trading calendar must not be empty".into(),
            ));
        }
        if config.factor_code.is_some() && factors.is_none() {
            return Err(RotationError::Config(
                "factor_code configured but no factor provider injected".into(),
            ));
        }
        Ok(Self {
            config,
            symbols,
            calendar,
            market_data,
            factors,
            last_batch: None,
        })
    }

    pub fn config(&self) -> &MonthlyRotationConfig {
        &self.config
    }

    /// Rank the universe for a rebalance date, best first.
    ///
    /// A failed external lookup is logged and yields an empty ranking: one
    /// missed rebalance must not abort a multi-year run.
    fn rank_universe(&self, date: NaiveDate) -> Vec<(Symbol, f64)> {
        let mut scores = match (&self.config.factor_code, &self.factors) {
            (Some(code), Some(provider)) => match provider.factor_scores(code, date) {
                Ok(rows) => rows.into_iter().map(|r| (r.symbol, r.value)).collect(),
                Err(err) => {
                    warn!(%date, factor = %code, error = %err, "factor lookup failed, skipping rebalance");
                    Vec::new()
                }
            },
            _ => self.amplitude_scores(),
        };

        // Stable sort, score descending: ties keep provider/universe order
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(self.config.stock_count);
        scores
    }

    /// Amplitude factor over the daily lookback window:
    /// (highest high - lowest low) / lowest low.
    fn amplitude_scores(&self) -> Vec<(Symbol, f64)> {
        let mut scores = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            let bars = match self.market_data.get_bars(
                symbol,
                Interval::Daily,
                self.config.volatility_lookback,
            ) {
                Ok(bars) if !bars.is_empty() => bars,
                Ok(_) => continue,
                Err(err) => {
                    warn!(%symbol, error = %err, "daily bar lookup failed, symbol skipped");
                    continue;
                }
            };

            let highest = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lowest = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            if lowest <= 0.0 {
                continue;
            }
            scores.push((symbol.clone(), (highest - lowest) / lowest));
        }
        scores
    }

    /// Buy the ranked selection, sizing each position from the allocated
    /// capital and the current quote. Symbols without a quote fall back to
    /// the configured default price and volume.
    fn rebalance(&self, date: NaiveDate, time: DateTime<Utc>) -> Vec<TradeIntent> {
        let selection = self.rank_universe(date);
        if selection.is_empty() {
            info!(%date, "rebalance produced no candidates");
            return Vec::new();
        }

        let mut intents = Vec::with_capacity(selection.len());
        for (symbol, score) in selection {
            let (price, size) = match self.market_data.get_price(&symbol) {
                Ok(price) if price > 0.0 => {
                    let size = (self.config.capital_per_stock / price).floor();
                    if size < 1.0 {
                        warn!(%symbol, price, "allocated capital buys less than one unit, skipped");
                        continue;
                    }
                    (price, size)
                }
                Ok(price) => {
                    warn!(%symbol, price, "non-positive quote, symbol skipped");
                    continue;
                }
                Err(err) => {
                    debug!(%symbol, error = %err, "no quote, using default price and volume");
                    (self.config.default_price, self.config.default_volume)
                }
            };

            info!(%symbol, price, size, score, "monthly rebalance buy");
            intents.push(TradeIntent::buy(symbol, price, size, time));
        }
        intents
    }
}

impl Strategy for MonthlyRotationStrategy {
    fn name(&self) -> &'static str {
        "monthly_volatility"
    }

    fn warmup_bars(&self) -> usize {
        self.config.warmup_bars
    }

    fn initialize(&mut self) {
        info!(strategy = self.name(), "initializing");
        self.last_batch = None;
    }

    fn on_bar(&mut self, bar: &Bar) -> Result<Vec<TradeIntent>> {
        self.on_bars(std::slice::from_ref(bar))
    }

    fn on_bars(&mut self, bars: &[Bar]) -> Result<Vec<TradeIntent>> {
        let Some(first) = bars.first() else {
            return Ok(Vec::new());
        };

        if let Some(last) = self.last_batch {
            if first.datetime < last {
                return Err(RotationError::OutOfOrderBar {
                    symbol: first.symbol.clone(),
                    datetime: first.datetime,
                    last_seen: last,
                });
            }
        }

        let date = first.datetime.date_naive();
        // The calendar must cover every evaluated date; anything else would
        // silently corrupt rebalance timing
        self.calendar.require(date)?;

        // One trigger evaluation per trading date
        let already_evaluated = self
            .last_batch
            .is_some_and(|last| last.date_naive() == date);
        self.last_batch = Some(first.datetime);
        if already_evaluated {
            return Ok(Vec::new());
        }

        let mut intents = Vec::new();

        if self.calendar.is_month_start(date)? {
            info!(%date, "first trading day of month, rebalancing");
            intents.extend(self.rebalance(date, first.datetime));
        }

        if self.calendar.is_month_end(date)? {
            info!(%date, "last trading day of month, liquidating");
            intents.push(TradeIntent::close_all(first.datetime));
        }

        Ok(intents)
    }
}
