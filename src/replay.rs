//! Minimal replay harness.
//!
//! Stands in for the external engine's delivery loop: merges per-symbol bar
//! streams into time-aligned batches, pre-feeds the warm-up window, then
//! delivers live batches and collects the emitted intents. No matching, no
//! fees, no statistics; those stay with the real engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{debug, info};

use crate::strategies::Strategy;
use crate::types::{Bar, Interval, Symbol, TradeIntent};

/// Shared replay position, advanced batch by batch.
///
/// Dataset-backed collaborators hold a clone and must only serve data at or
/// before the bar currently being evaluated; a strategy ranking a rebalance
/// with bars from after the trigger would invalidate the whole run.
#[derive(Debug, Clone)]
pub struct ReplayClock(Arc<AtomicI64>);

impl ReplayClock {
    pub fn advance(&self, to: DateTime<Utc>) {
        self.0.store(to.timestamp_micros(), Ordering::Release);
    }

    /// Timestamp of the batch being evaluated, None before the first batch.
    pub fn now(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.load(Ordering::Acquire);
        if raw == i64::MIN {
            None
        } else {
            DateTime::from_timestamp_micros(raw)
        }
    }
}

impl Default for ReplayClock {
    fn default() -> Self {
        ReplayClock(Arc::new(AtomicI64::new(i64::MIN)))
    }
}

/// Outcome of one replay run.
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub intents: Vec<TradeIntent>,
    pub batches_delivered: usize,
    pub bars_delivered: usize,
}

/// Replay a multi-symbol dataset through a strategy.
///
/// Bars are merged across symbols into non-decreasing timestamp order;
/// bars sharing a timestamp form one synchronized batch, with symbols in
/// lexical order so identical inputs replay identically. The first
/// `warmup_bars()` batches are delivered as history: state advances but
/// their intents are discarded. `clock` is advanced to each batch timestamp
/// before the batch is delivered.
pub fn run(
    strategy: &mut dyn Strategy,
    data: &HashMap<Symbol, Vec<Bar>>,
    clock: &ReplayClock,
) -> Result<ReplayReport> {
    let mut merged: Vec<Bar> = Vec::new();
    for symbol in data.keys().sorted_by_key(|s| s.as_str().to_owned()) {
        merged.extend(data[symbol].iter().cloned());
    }
    // Stable sort keeps the lexical symbol order within each timestamp
    merged.sort_by_key(|bar| bar.datetime);

    strategy.initialize();
    let warmup = strategy.warmup_bars();

    let mut report = ReplayReport::default();
    for (timestamp, batch) in &merged.iter().chunk_by(|bar| bar.datetime) {
        clock.advance(timestamp);
        let batch: Vec<Bar> = batch.cloned().collect();
        report.bars_delivered += batch.len();
        report.batches_delivered += 1;

        let intents = strategy.on_bars(&batch)?;
        if report.batches_delivered <= warmup {
            debug!(%timestamp, "warm-up batch, intents discarded");
            continue;
        }
        report.intents.extend(intents);
    }

    info!(
        batches = report.batches_delivered,
        bars = report.bars_delivered,
        intents = report.intents.len(),
        "replay finished"
    );
    Ok(report)
}

/// Replay-time market data backed by the loaded dataset: daily bars are
/// aggregated up front, quotes come from each symbol's latest visible close.
///
/// Visibility is bounded by the shared [`ReplayClock`]: lookups only see
/// bars timestamped at or before the batch currently being evaluated, so a
/// mid-run rebalance is ranked and priced the way a live run would be.
pub struct HistoricalMarketData {
    daily: HashMap<Symbol, Vec<Bar>>,
    clock: ReplayClock,
}

impl HistoricalMarketData {
    pub fn from_dataset(data: &HashMap<Symbol, Vec<Bar>>, clock: ReplayClock) -> Result<Self> {
        let mut daily = HashMap::new();
        for (symbol, bars) in data {
            let mut aggregator = crate::aggregator::BarAggregator::new(Interval::Daily)?;
            for bar in bars {
                aggregator.update(bar)?;
            }
            daily.insert(symbol.clone(), aggregator.flush());
        }
        Ok(Self { daily, clock })
    }

    fn visible_bars(&self, symbol: &Symbol) -> Result<Vec<Bar>> {
        let now = self
            .clock
            .now()
            .ok_or_else(|| anyhow::anyhow!("replay has not delivered any bar yet"))?;
        let bars = self
            .daily
            .get(symbol)
            .ok_or_else(|| anyhow::anyhow!("no data for {}", symbol))?;
        Ok(bars
            .iter()
            .filter(|bar| bar.datetime <= now)
            .cloned()
            .collect())
    }
}

impl crate::engine::MarketData for HistoricalMarketData {
    fn get_bars(&self, symbol: &Symbol, interval: Interval, count: usize) -> Result<Vec<Bar>> {
        if interval != Interval::Daily {
            anyhow::bail!("replay market data only serves daily bars, got {}", interval);
        }
        let bars = self.visible_bars(symbol)?;
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    fn get_price(&self, symbol: &Symbol) -> Result<f64> {
        self.visible_bars(symbol)?
            .last()
            .map(|bar| bar.close)
            .ok_or_else(|| anyhow::anyhow!("no quote for {}", symbol))
    }
}
