//! Rotation strategies - main entry point
//!
//! Two subcommands:
//! - aggregate: fold minute kline CSVs into daily/monthly bars
//! - replay: drive a configured strategy over exported data

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "rotation-strategies")]
#[command(about = "Bar aggregation and rule-based rotation strategies", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate a minute kline CSV into coarse bars
    Aggregate {
        /// Input CSV (datetime,open,high,low,close,volume[,turnover])
        #[arg(short, long)]
        input: String,

        /// Output CSV path
        #[arg(short, long)]
        output: String,

        /// Symbol the input belongs to
        #[arg(short, long)]
        symbol: String,

        /// Target granularity (daily or monthly)
        #[arg(short, long, default_value = "monthly")]
        target: String,
    },

    /// Replay a strategy over exported kline data
    Replay {
        /// Path to replay configuration file
        #[arg(short, long, default_value = "configs/momentum.json")]
        config: String,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Aggregate { .. } => "aggregate",
        Commands::Replay { .. } => "replay",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Aggregate {
            input,
            output,
            symbol,
            target,
        } => commands::aggregate::run(input, output, symbol, target),

        Commands::Replay { config } => commands::replay::run(config),
    }
}
