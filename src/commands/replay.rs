//! Replay command: drive a configured strategy over exported kline data
//! and report the intents it would have sent to the engine.

use anyhow::{Context, Result};
use tracing::info;

use rotation_strategies::config::{ReplayConfig, StrategyConfig};
use rotation_strategies::data::{load_calendar, load_multi_symbol};
use rotation_strategies::replay::{self, HistoricalMarketData, ReplayClock};
use rotation_strategies::strategies::momentum::MomentumRotationStrategy;
use rotation_strategies::strategies::monthly_volatility::MonthlyRotationStrategy;
use rotation_strategies::strategies::Strategy;

pub fn run(config_path: String) -> Result<()> {
    let config = ReplayConfig::from_file(&config_path)
        .context(format!("Failed to load {}", config_path))?;
    info!("Running {} replay", config.strategy_name());

    let symbols = config.symbols();
    let data = load_multi_symbol(&config.data_dir, &symbols, config.interval)?;
    let clock = ReplayClock::default();

    let mut strategy: Box<dyn Strategy> = match &config.strategy {
        StrategyConfig::MomentumRotation(params) => {
            Box::new(MomentumRotationStrategy::new(params.clone())?)
        }
        StrategyConfig::MonthlyVolatility(params) => {
            let calendar_file = config
                .calendar_file
                .as_ref()
                .context("monthly_volatility requires calendar_file in the config")?;
            let calendar = load_calendar(calendar_file)?;
            let market_data = HistoricalMarketData::from_dataset(&data, clock.clone())?;
            Box::new(MonthlyRotationStrategy::new(
                params.clone(),
                symbols,
                calendar,
                Box::new(market_data),
                None,
            )?)
        }
    };

    let report = replay::run(strategy.as_mut(), &data, &clock)?;

    info!(
        "Replay delivered {} bars in {} batches",
        report.bars_delivered, report.batches_delivered
    );
    println!("{}", serde_json::to_string_pretty(&report.intents)?);
    Ok(())
}
