//! Aggregate command: fold a fine-grained kline CSV into coarse bars.

use anyhow::{Context, Result};
use tracing::info;

use rotation_strategies::aggregator::BarAggregator;
use rotation_strategies::data::{load_csv, save_csv, validate_bars};
use rotation_strategies::types::{Interval, Symbol};

pub fn run(input: String, output: String, symbol: String, target: String) -> Result<()> {
    let target = match target.as_str() {
        "daily" => Interval::Daily,
        "monthly" => Interval::Monthly,
        other => anyhow::bail!("unsupported target interval: {} (use daily or monthly)", other),
    };

    let symbol = Symbol::new(symbol);
    let bars = load_csv(&input, &symbol, Interval::Minute)
        .context(format!("Failed to load {}", input))?;
    info!("Loaded {} bars from {}", bars.len(), input);

    let report = validate_bars(&bars);
    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }
    if !report.is_valid() {
        anyhow::bail!("Input data failed validation: {}", report.errors.join("; "));
    }

    let mut aggregator = BarAggregator::new(target)?;
    for bar in &bars {
        aggregator.update(bar)?;
    }
    let coarse = aggregator.flush();

    info!("Aggregated into {} {} bars", coarse.len(), target);
    for bar in &coarse {
        info!(
            "{}: open={} high={} low={} close={} volume={} turnover={}",
            bar.datetime.format("%Y-%m"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume,
            bar.turnover
        );
    }

    save_csv(&coarse, &output)?;
    Ok(())
}
