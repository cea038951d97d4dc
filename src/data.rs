//! Loading bar data and trading calendars from CSV files.
//!
//! The crate owns no storage format; these helpers only parse already
//! exported kline files into `Bar` records for the replay harness.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::calendar::TradingCalendar;
use crate::types::{Bar, Interval, Symbol};

/// Load bars for one symbol from a CSV file with columns
/// `datetime,open,high,low,close,volume[,turnover]`.
pub fn load_csv(path: impl AsRef<Path>, symbol: &Symbol, interval: Interval) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path.as_ref()).context("Failed to open CSV file")?;

    let mut bars = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let datetime = dt_str
            .parse::<DateTime<Utc>>()
            .or_else(|_| {
                // Try parsing without timezone and assume UTC
                chrono::NaiveDateTime::parse_from_str(dt_str, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
            })
            .context(format!("Failed to parse datetime: {}", dt_str))?;

        let open: f64 = record
            .get(1)
            .context("Missing open column")?
            .parse()
            .context("Failed to parse open")?;
        let high: f64 = record
            .get(2)
            .context("Missing high column")?
            .parse()
            .context("Failed to parse high")?;
        let low: f64 = record
            .get(3)
            .context("Missing low column")?
            .parse()
            .context("Failed to parse low")?;
        let close: f64 = record
            .get(4)
            .context("Missing close column")?
            .parse()
            .context("Failed to parse close")?;
        let volume: f64 = record
            .get(5)
            .context("Missing volume column")?
            .parse()
            .context("Failed to parse volume")?;
        let turnover: f64 = match record.get(6) {
            Some(v) if !v.is_empty() => v.parse().context("Failed to parse turnover")?,
            _ => 0.0,
        };

        bars.push(Bar {
            symbol: symbol.clone(),
            datetime,
            interval,
            open,
            high,
            low,
            close,
            volume,
            turnover,
        });
    }

    Ok(bars)
}

/// Load data for multiple symbols from `{symbol}_{interval}.csv` files.
pub fn load_multi_symbol(
    data_dir: impl AsRef<Path>,
    symbols: &[Symbol],
    interval: Interval,
) -> Result<HashMap<Symbol, Vec<Bar>>> {
    let mut data = HashMap::new();

    for symbol in symbols {
        let filename = format!("{}_{}.csv", symbol.as_str(), interval);
        let path = data_dir.as_ref().join(&filename);

        if !path.exists() {
            warn!("Data file not found: {}", path.display());
            continue;
        }

        let bars =
            load_csv(&path, symbol, interval).context(format!("Failed to load data for {}", symbol))?;

        info!("Loaded {} bars for {}", bars.len(), symbol);
        data.insert(symbol.clone(), bars);
    }

    if data.is_empty() {
        anyhow::bail!("No data loaded for any symbol");
    }

    Ok(data)
}

/// Load a trading calendar from a text file with one `YYYY-MM-DD` date per
/// line. A leading header line is skipped.
pub fn load_calendar(path: impl AsRef<Path>) -> Result<TradingCalendar> {
    let contents =
        std::fs::read_to_string(path.as_ref()).context("Failed to read calendar file")?;

    let mut days = Vec::new();
    for (line_idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<NaiveDate>() {
            Ok(date) => days.push(date),
            Err(err) => {
                if line_idx == 0 {
                    continue; // header row
                }
                anyhow::bail!("Invalid calendar date on line {}: {} ({})", line_idx + 1, line, err);
            }
        }
    }

    if days.is_empty() {
        anyhow::bail!("Calendar file contains no dates");
    }

    Ok(TradingCalendar::new(days))
}

/// Write bars to a CSV file with the same column layout `load_csv` reads.
pub fn save_csv(bars: &[Bar], path: impl AsRef<Path>) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path.as_ref()).context("Failed to create output file")?;
    writeln!(file, "datetime,open,high,low,close,volume,turnover")?;
    for bar in bars {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            bar.datetime.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume,
            bar.turnover
        )?;
    }

    info!("Saved {} bars to {}", bars.len(), path.as_ref().display());
    Ok(())
}

/// Validate a bar stream for consistency
pub fn validate_bars(bars: &[Bar]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if bars.is_empty() {
        errors.push("No bars provided".to_string());
        return ValidationResult { errors, warnings };
    }

    for (i, bar) in bars.iter().enumerate() {
        if let Err(err) = bar.validate() {
            errors.push(format!("Bar {}: {}", i, err));
        }
        if i > 0 && bar.datetime < bars[i - 1].datetime {
            errors.push(format!("Bar {}: timestamp regression", i));
        } else if i > 0 && bar.datetime == bars[i - 1].datetime {
            warnings.push(format!("Bar {}: duplicate timestamp", i));
        }
    }

    ValidationResult { errors, warnings }
}

/// Result of data validation
#[derive(Debug)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
