//! Integration tests for the rotation-strategies crate
//!
//! These cover the externally observable properties: aggregation
//! correctness, decision quotas, threshold bands, ranking determinism, and
//! calendar failure modes.

use approx::assert_relative_eq;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

use rotation_strategies::aggregator::BarAggregator;
use rotation_strategies::calendar::TradingCalendar;
use rotation_strategies::replay::{self, HistoricalMarketData, ReplayClock};
use rotation_strategies::strategies::momentum::{
    MomentumRotationConfig, MomentumRotationStrategy,
};
use rotation_strategies::strategies::monthly_volatility::{
    MonthlyRotationConfig, MonthlyRotationStrategy,
};
use rotation_strategies::strategies::Strategy;
use rotation_strategies::{Bar, Interval, RotationError, Symbol, TradeIntent};

// =============================================================================
// Test Utilities
// =============================================================================

fn minute_bar(
    symbol: &str,
    (y, m, d): (i32, u32, u32),
    (hh, mm): (u32, u32),
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
) -> Bar {
    Bar {
        symbol: Symbol::new(symbol),
        datetime: Utc.with_ymd_and_hms(y, m, d, hh, mm, 0).unwrap(),
        interval: Interval::Minute,
        open,
        high,
        low,
        close,
        volume,
        turnover: close * volume,
    }
}

/// Flat bar: all four prices equal, so average price == close
fn flat_bar(symbol: &str, ymd: (i32, u32, u32), hm: (u32, u32), price: f64) -> Bar {
    minute_bar(symbol, ymd, hm, price, price, price, price, 1000.0)
}

fn buys(intents: &[TradeIntent]) -> Vec<(&str, f64)> {
    intents
        .iter()
        .filter_map(|intent| match intent {
            TradeIntent::Buy { symbol, price, .. } => Some((symbol.as_str(), *price)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Aggregator Properties
// =============================================================================

#[test]
fn test_aggregation_correctness_over_one_period() {
    let bars = vec![
        minute_bar("600011", (2023, 4, 3), (9, 30), 10.0, 10.4, 9.9, 10.2, 120.0),
        minute_bar("600011", (2023, 4, 3), (9, 31), 10.2, 10.9, 10.1, 10.8, 80.0),
        minute_bar("600011", (2023, 4, 14), (9, 30), 10.8, 11.0, 9.5, 9.7, 200.0),
        minute_bar("600011", (2023, 4, 28), (9, 30), 9.7, 9.8, 9.2, 9.6, 150.0),
    ];

    let mut agg = BarAggregator::new(Interval::Monthly).unwrap();
    for bar in &bars {
        agg.update(bar).unwrap();
    }
    let out = agg.flush();

    assert_eq!(out.len(), 1);
    let monthly = &out[0];
    assert_eq!(monthly.open, bars[0].open);
    assert_eq!(monthly.close, bars.last().unwrap().close);
    assert_eq!(monthly.high, 11.0);
    assert_eq!(monthly.low, 9.2);
    assert_relative_eq!(monthly.volume, 550.0);
    let expected_turnover: f64 = bars.iter().map(|b| b.turnover).sum();
    assert_relative_eq!(monthly.turnover, expected_turnover);
}

#[test]
fn test_period_partition_reconstructs_input() {
    // Two symbols, three months, with a gap month for one symbol
    let mut bars = Vec::new();
    for (symbol, months) in [("600011", vec![1, 2, 3]), ("000001", vec![1, 3])] {
        for month in months {
            for day in [5, 15] {
                bars.push(minute_bar(
                    symbol,
                    (2023, month, day),
                    (10, 0),
                    10.0,
                    10.5,
                    9.5,
                    10.0 + day as f64 * 0.01,
                    50.0,
                ));
            }
        }
    }

    let mut agg = BarAggregator::new(Interval::Monthly).unwrap();
    for bar in &bars {
        agg.update(bar).unwrap();
    }
    let out = agg.flush();

    // Each observed (symbol, month) yields exactly one coarse bar
    let mut expected: BTreeMap<(String, u32), (f64, f64)> = BTreeMap::new();
    for bar in &bars {
        use chrono::Datelike;
        let entry = expected
            .entry((bar.symbol.to_string(), bar.datetime.date_naive().month()))
            .or_insert((0.0, 0.0));
        entry.0 += bar.volume;
        entry.1 += bar.turnover;
    }
    assert_eq!(out.len(), expected.len());

    // No bar dropped or duplicated: per-period sums match exactly
    for coarse in &out {
        use chrono::Datelike;
        let key = (
            coarse.symbol.to_string(),
            coarse.datetime.date_naive().month(),
        );
        let (volume, turnover) = expected.remove(&key).expect("unexpected period emitted");
        assert_relative_eq!(coarse.volume, volume);
        assert_relative_eq!(coarse.turnover, turnover);
    }
    assert!(expected.is_empty());
}

#[test]
fn test_flush_idempotence() {
    let mut agg = BarAggregator::new(Interval::Monthly).unwrap();
    agg.update(&flat_bar("600011", (2023, 1, 3), (9, 30), 10.0))
        .unwrap();

    let first = agg.flush();
    let second = agg.flush();
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());

    // An update after flush opens a fresh accumulator
    agg.update(&flat_bar("600011", (2023, 2, 1), (9, 30), 11.0))
        .unwrap();
    assert_eq!(agg.flush().len(), 1);
}

// =============================================================================
// Momentum Selector Properties
// =============================================================================

fn wide_band_strategy(max_positions: usize) -> MomentumRotationStrategy {
    // Band wide enough that any gain qualifies; tests control selection
    // through prices alone
    let config = MomentumRotationConfig {
        max_positions,
        buy_threshold_min: -0.5,
        buy_threshold_max: 1.0,
        ..Default::default()
    };
    let mut strategy = MomentumRotationStrategy::new(config).unwrap();
    strategy.initialize();
    strategy
}

/// Establish day-1 closes, then deliver day-2 morning bars so every
/// symbol's session rollover happens before the decision window opens
/// (the rollover clears the shared candidate list).
fn seed_closes(strategy: &mut MomentumRotationStrategy, symbols: &[&str], close: f64) {
    for symbol in symbols {
        strategy
            .on_bar(&flat_bar(symbol, (2023, 5, 8), (14, 0), close))
            .unwrap();
    }
    for symbol in symbols {
        strategy
            .on_bar(&flat_bar(symbol, (2023, 5, 9), (9, 30), close))
            .unwrap();
    }
}

#[test]
fn test_single_buy_in_band_scenario() {
    // Day 1 close = 100, day 2 average = 109.6 (9.6%, inside [9.5%, 9.9%])
    let mut strategy =
        MomentumRotationStrategy::new(MomentumRotationConfig::default()).unwrap();
    strategy.initialize();

    strategy
        .on_bar(&flat_bar("600011", (2023, 5, 8), (14, 0), 100.0))
        .unwrap();
    let intents = strategy
        .on_bar(&flat_bar("600011", (2023, 5, 9), (15, 0), 109.6))
        .unwrap();

    assert_eq!(buys(&intents), vec![("600011", 109.6)]);
}

#[test]
fn test_quota_invariant_never_exceeded() {
    let mut strategy = wide_band_strategy(5);
    let symbols: Vec<String> = (0..8).map(|i| format!("60001{}", i)).collect();
    let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
    seed_closes(&mut strategy, &refs, 100.0);

    let mut all_intents = Vec::new();
    for (i, symbol) in refs.iter().enumerate() {
        let intents = strategy
            .on_bar(&flat_bar(
                symbol,
                (2023, 5, 9),
                (13, i as u32 + 1),
                101.0 + i as f64,
            ))
            .unwrap();
        all_intents.extend(intents);
    }
    // Session-end bars for the stragglers
    for symbol in &refs {
        let intents = strategy
            .on_bar(&flat_bar(symbol, (2023, 5, 9), (15, 0), 120.0))
            .unwrap();
        all_intents.extend(intents);
    }

    assert_eq!(buys(&all_intents).len(), 5);
}

#[test]
fn test_six_candidates_max_five_excludes_lowest() {
    let mut strategy = wide_band_strategy(5);
    let symbols = ["600010", "600011", "600012", "600013", "600014", "600015"];
    seed_closes(&mut strategy, &symbols, 100.0);

    // Five qualifying candidates; the decision fires when the quota-sized
    // list is full, the sixth (lowest-priced) arrives afterwards
    let prices = [112.0, 111.0, 110.5, 110.2, 110.1, 109.0];
    let mut all_intents = Vec::new();
    for (i, (symbol, price)) in symbols.iter().zip(prices).enumerate() {
        let intents = strategy
            .on_bar(&flat_bar(symbol, (2023, 5, 9), (13, i as u32 + 1), price))
            .unwrap();
        all_intents.extend(intents);
    }

    let bought = buys(&all_intents);
    assert_eq!(bought.len(), 5);
    assert!(
        !bought.iter().any(|(symbol, _)| *symbol == "600015"),
        "lowest-priced candidate should be excluded"
    );
    // Ranked by price descending
    assert_eq!(bought[0], ("600010", 112.0));
    assert_eq!(bought[4], ("600014", 110.1));
}

#[test]
fn test_tie_break_preserves_arrival_order() {
    // Candidates priced [10, 12, 12, 9]: top of the ranking must be the
    // first-arriving 12, then the second 12
    let mut strategy = wide_band_strategy(4);
    let symbols = ["600020", "600021", "600022", "600023"];
    seed_closes(&mut strategy, &symbols, 10.0);

    let prices = [10.0, 12.0, 12.0, 9.0];
    let mut all_intents = Vec::new();
    for (i, (symbol, price)) in symbols.iter().zip(prices).enumerate() {
        let intents = strategy
            .on_bar(&flat_bar(symbol, (2023, 5, 9), (13, i as u32 + 1), price))
            .unwrap();
        all_intents.extend(intents);
    }

    let bought = buys(&all_intents);
    assert_eq!(
        bought,
        vec![
            ("600021", 12.0), // first 12 keeps its arrival rank
            ("600022", 12.0),
            ("600020", 10.0),
            ("600023", 9.0),
        ]
    );
}

#[test]
fn test_threshold_requires_band_and_not_bought() {
    let mut strategy =
        MomentumRotationStrategy::new(MomentumRotationConfig::default()).unwrap();
    strategy.initialize();
    seed_closes(&mut strategy, &["600011", "600012"], 100.0);

    // 600011 inside the band, 600012 far above it
    let mut all_intents = Vec::new();
    all_intents.extend(
        strategy
            .on_bar(&flat_bar("600011", (2023, 5, 9), (14, 0), 109.6))
            .unwrap(),
    );
    all_intents.extend(
        strategy
            .on_bar(&flat_bar("600012", (2023, 5, 9), (14, 1), 115.0))
            .unwrap(),
    );
    // Session-end bar, itself out of band, fires the decision
    all_intents.extend(
        strategy
            .on_bar(&flat_bar("600011", (2023, 5, 9), (15, 0), 112.0))
            .unwrap(),
    );

    let bought = buys(&all_intents);
    assert_eq!(bought, vec![("600011", 109.6)]);
}

#[test]
fn test_candidates_cleared_on_date_rollover() {
    let mut strategy = wide_band_strategy(5);
    seed_closes(&mut strategy, &["600011"], 100.0);

    // Day 2: one qualifying candidate, but no decision point reached
    strategy
        .on_bar(&flat_bar("600011", (2023, 5, 9), (13, 30), 105.0))
        .unwrap();

    // Day 3 session end: the stale candidate must not be bought; only the
    // fresh day-3 candidate is
    let intents = strategy
        .on_bar(&flat_bar("600011", (2023, 5, 10), (15, 0), 108.0))
        .unwrap();
    let bought = buys(&intents);
    assert_eq!(bought.len(), 1);
    assert_eq!(bought[0].1, 108.0);
}

// =============================================================================
// Monthly Rotation Properties
// =============================================================================

struct DatasetMarket {
    daily: HashMap<Symbol, Vec<Bar>>,
}

impl rotation_strategies::engine::MarketData for DatasetMarket {
    fn get_bars(
        &self,
        symbol: &Symbol,
        _interval: Interval,
        count: usize,
    ) -> anyhow::Result<Vec<Bar>> {
        let bars = self
            .daily
            .get(symbol)
            .ok_or_else(|| anyhow::anyhow!("no data for {}", symbol))?;
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    fn get_price(&self, symbol: &Symbol) -> anyhow::Result<f64> {
        self.daily
            .get(symbol)
            .and_then(|bars| bars.last())
            .map(|bar| bar.close)
            .ok_or_else(|| anyhow::anyhow!("no quote for {}", symbol))
    }
}

fn daily_bar(symbol: &str, ymd: (i32, u32, u32), high: f64, low: f64, close: f64) -> Bar {
    let (y, m, d) = ymd;
    Bar {
        symbol: Symbol::new(symbol),
        datetime: Utc.with_ymd_and_hms(y, m, d, 15, 0, 0).unwrap(),
        interval: Interval::Daily,
        open: close,
        high,
        low,
        close,
        volume: 10_000.0,
        turnover: close * 10_000.0,
    }
}

fn june_calendar() -> TradingCalendar {
    use chrono::Datelike;
    let mut days = Vec::new();
    for d in [30, 31] {
        days.push(NaiveDate::from_ymd_opt(2023, 5, d).unwrap());
    }
    for d in 1..=30 {
        let date = NaiveDate::from_ymd_opt(2023, 6, d).unwrap();
        if date.weekday().number_from_monday() <= 5 {
            days.push(date);
        }
    }
    days.push(NaiveDate::from_ymd_opt(2023, 7, 3).unwrap());
    TradingCalendar::new(days)
}

fn monthly_strategy(stock_count: usize) -> MonthlyRotationStrategy {
    let symbols = vec![Symbol::new("600011"), Symbol::new("600012")];
    let mut daily = HashMap::new();
    // 600011 has twice the amplitude of 600012
    daily.insert(
        Symbol::new("600011"),
        (1..=20)
            .map(|d| daily_bar("600011", (2023, 5, d), 12.0, 8.0, 10.0))
            .collect(),
    );
    daily.insert(
        Symbol::new("600012"),
        (1..=20)
            .map(|d| daily_bar("600012", (2023, 5, d), 10.4, 9.6, 10.0))
            .collect(),
    );

    let config = MonthlyRotationConfig {
        stock_count,
        capital_per_stock: 100_000.0,
        ..Default::default()
    };
    let mut strategy = MonthlyRotationStrategy::new(
        config,
        symbols,
        june_calendar(),
        Box::new(DatasetMarket { daily }),
        None,
    )
    .unwrap();
    strategy.initialize();
    strategy
}

#[test]
fn test_month_boundary_liquidation_and_rebalance() {
    let mut strategy = monthly_strategy(1);

    // Last trading day of May
    let intents = strategy
        .on_bars(&[daily_bar("600011", (2023, 5, 31), 10.5, 9.5, 10.0)])
        .unwrap();
    assert_eq!(intents.len(), 1);
    assert!(matches!(intents[0], TradeIntent::CloseAll { .. }));

    // First trading day of June: amplitude ranking buys the wide symbol
    let intents = strategy
        .on_bars(&[daily_bar("600011", (2023, 6, 1), 10.5, 9.5, 10.0)])
        .unwrap();
    let bought = buys(&intents);
    assert_eq!(bought.len(), 1);
    assert_eq!(bought[0].0, "600011");
    assert_eq!(bought[0].1, 10.0);
}

#[test]
fn test_rebalance_sizing_from_capital() {
    let mut strategy = monthly_strategy(2);
    let intents = strategy
        .on_bars(&[daily_bar("600011", (2023, 6, 1), 10.5, 9.5, 10.0)])
        .unwrap();

    for intent in &intents {
        match intent {
            TradeIntent::Buy { price, size, .. } => {
                assert_eq!(*price, 10.0);
                assert_eq!(*size, 10_000.0); // 100,000 / 10
            }
            other => panic!("expected buy, got {:?}", other),
        }
    }
    assert_eq!(intents.len(), 2);
}

#[test]
fn test_replayed_rebalance_sees_no_data_past_its_trigger() {
    // The dataset runs well past the June 1 rebalance and ends on a much
    // higher close. The rebalance must be priced off the June 1 quote, not
    // anything later in the dataset.
    let symbol = Symbol::new("600011");
    let data = HashMap::from([(
        symbol.clone(),
        vec![
            flat_bar("600011", (2023, 5, 30), (15, 0), 10.0),
            flat_bar("600011", (2023, 5, 31), (15, 0), 10.0),
            flat_bar("600011", (2023, 6, 1), (15, 0), 10.0),
            flat_bar("600011", (2023, 6, 30), (15, 0), 99.0),
        ],
    )]);

    let clock = ReplayClock::default();
    let market = HistoricalMarketData::from_dataset(&data, clock.clone()).unwrap();
    let config = MonthlyRotationConfig {
        stock_count: 1,
        capital_per_stock: 100_000.0,
        ..Default::default()
    };
    let mut strategy = MonthlyRotationStrategy::new(
        config,
        vec![symbol],
        june_calendar(),
        Box::new(market),
        None,
    )
    .unwrap();

    let report = replay::run(&mut strategy, &data, &clock).unwrap();

    let buy = report
        .intents
        .iter()
        .find_map(|intent| match intent {
            TradeIntent::Buy { price, size, time, .. } => Some((*price, *size, *time)),
            _ => None,
        })
        .expect("the June rebalance should emit a buy");
    assert_eq!(buy.2.date_naive(), NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    assert_eq!(buy.0, 10.0, "rebalance priced with a quote from after its trigger");
    assert_eq!(buy.1, 10_000.0); // 100,000 / 10
}

#[test]
fn test_missing_calendar_date_is_fatal_with_no_intents() {
    let mut strategy = monthly_strategy(1);
    // June 3, 2023 is a Saturday: not a trading day
    let result = strategy.on_bars(&[daily_bar("600011", (2023, 6, 3), 10.5, 9.5, 10.0)]);
    match result {
        Err(RotationError::DateNotInCalendar(date)) => {
            assert_eq!(date, NaiveDate::from_ymd_opt(2023, 6, 3).unwrap());
        }
        other => panic!("expected calendar error, got {:?}", other),
    }
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_identical_streams_produce_identical_intents() {
    let run = || {
        let mut strategy = wide_band_strategy(3);
        let symbols = ["600011", "600012", "600013", "600014"];
        seed_closes(&mut strategy, &symbols, 100.0);

        let mut intents = Vec::new();
        for (i, symbol) in symbols.iter().enumerate() {
            intents.extend(
                strategy
                    .on_bar(&flat_bar(
                        symbol,
                        (2023, 5, 9),
                        (13, i as u32 + 1),
                        104.0,
                    ))
                    .unwrap(),
            );
        }
        intents
    };

    assert_eq!(run(), run());
}
