//! PriceCast CLI: ingest a daily price history, clean it and forecast it.
//!
//! All three stages always run; stage failures are logged and summarized
//! but do not change the exit code. Only argument or config-file errors
//! exit non-zero.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use pricecast_core::data::{CircuitBreaker, PriceProvider, SyntheticProvider, YahooProvider};
use pricecast_runner::{run_pipeline, PipelineConfig, PipelineReport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "pricecast",
    about = "PriceCast: daily equity price ingestion and ARIMA forecasting"
)]
struct Cli {
    /// TOML config file. Command-line values override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker symbol. Defaults to AAPL.
    #[arg(long)]
    symbol: Option<String>,

    /// Start date (YYYY-MM-DD, inclusive). Defaults to 2010-01-01.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD, exclusive). Defaults to 2023-12-31.
    #[arg(long)]
    end: Option<String>,

    /// Dataset CSV path. Overwritten on every run.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Number of days to forecast. Defaults to 30.
    #[arg(long)]
    horizon: Option<usize>,

    /// Use the deterministic synthetic provider instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    config.validate()?;

    let provider: Box<dyn PriceProvider> = if cli.synthetic {
        Box::new(SyntheticProvider::new())
    } else {
        let breaker = Arc::new(CircuitBreaker::new(config.provider.breaker_cooldown()));
        Box::new(YahooProvider::new(&config.provider, breaker)?)
    };

    info!(symbol = %config.symbol, provider = provider.name(), "provider selected");
    let report = run_pipeline(&config, provider.as_ref(), None);
    print_report(&config, &report);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{value}'"))
}

/// Config file (or defaults), then command-line overrides.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            PipelineConfig::from_file(path)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(symbol) = &cli.symbol {
        config.symbol = symbol.clone();
    }
    if let Some(start) = &cli.start {
        config.start = parse_date("start", start)?;
    }
    if let Some(end) = &cli.end {
        config.end = parse_date("end", end)?;
    }
    if let Some(dataset) = &cli.dataset {
        config.dataset = dataset.clone();
    }
    if let Some(horizon) = cli.horizon {
        config.horizon = horizon;
    }
    Ok(config)
}

fn print_report(config: &PipelineConfig, report: &PipelineReport) {
    println!("=== PriceCast: {} ===", config.symbol);
    println!("Dataset: {}", config.dataset.display());

    match &report.ingest {
        Ok(s) => println!(
            "Ingest:   {} rows, {} .. {} ({})",
            s.rows, s.first_date, s.last_date, s.provider
        ),
        Err(e) => println!("Ingest:   FAILED: {e}"),
    }
    match &report.clean {
        Ok(c) => println!(
            "Clean:    {} rows kept, {} dropped ({} bad dates, {} bad closes, {} duplicates)",
            c.report.rows_kept,
            c.report.rows_dropped(),
            c.report.bad_dates,
            c.report.bad_closes,
            c.report.duplicate_dates
        ),
        Err(e) => println!("Clean:    FAILED: {e}"),
    }

    match &report.forecast {
        None => println!("Forecast: skipped"),
        Some(Err(e)) => println!("Forecast: FAILED: {e}"),
        Some(Ok(outcome)) => {
            let fc = &outcome.forecast;
            println!("Forecast: {} over {} steps", fc.model, fc.horizon());
            println!("  AR coefficients: {:?}", outcome.fit.ar);
            println!("  sigma2:          {:.6}", outcome.fit.sigma2);
            println!();
            println!("{:>6}  {:>14}", "step", "predicted");
            for point in &fc.points {
                println!("{:>6}  {:>14.4}", point.step, point.predicted_close);
            }
        }
    }
}
