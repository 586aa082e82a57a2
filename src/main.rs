use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use data_engine::{
    add_moving_average, add_moving_median, aggregate, generate_days, load_config, read_bars_csv,
    write_csv, Bar, BarSeries, Period,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Rolling statistics on intraday bars look back this many minutes.
const ROLLING_WINDOW_MINUTES: u32 = 30;

#[derive(Parser, Debug)]
#[command(version, about = "Simulated OHLC bar generator and aggregator")]
struct Cli {
    /// YAML settings file.
    #[arg(long, value_name = "FILE", default_value = "trading_settings.yaml")]
    config: PathBuf,

    /// Directory receiving the CSV exports.
    #[arg(long, value_name = "DIR", default_value = "result_data")]
    output_dir: PathBuf,

    /// First simulated date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Number of consecutive days to simulate.
    #[arg(long, default_value_t = 1)]
    days: u32,

    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Aggregate an existing one-minute export instead of generating bars.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Intraday periods exported with rolling statistics.
    #[arg(
        long,
        value_name = "PERIOD",
        value_delimiter = ',',
        default_value = "5min,30min",
        value_parser = parse_intraday_period
    )]
    periods: Vec<Period>,
}

/// The daily file is always written, so only sub-day periods are accepted here.
fn parse_intraday_period(s: &str) -> Result<Period, String> {
    match s.parse::<Period>().map_err(|e| e.to_string())? {
        Period::OneDay => Err("1D is always exported; pick 5min or 30min".to_string()),
        period => Ok(period),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating output directory {}", cli.output_dir.display()))?;

    info!("[Step 1/4] Preparing 1-minute OHLC data");
    let original = match &cli.input {
        Some(path) => read_bars_csv(path)
            .with_context(|| format!("reading one-minute bars from {}", path.display()))?,
        None => generate(&cli)?,
    };
    info!(bars = original.len(), "1-minute OHLC data ready");

    info!("[Step 2/4] Saving 1-minute OHLC data");
    write_csv(&original, cli.output_dir.join("ohlc_original_data.csv"))
        .context("saving 1-minute bars")?;

    info!("[Step 3/4] Processing intraday aggregates");
    for &period in &cli.periods {
        export_intraday(&original, period, &cli.output_dir)?;
    }

    info!("[Step 4/4] Processing 1-day aggregates");
    let daily = aggregate(&original, Period::OneDay);
    info!(bars = daily.len(), "aggregated to 1-day bars");
    write_csv(&daily, cli.output_dir.join("ohlc_1day_data.csv")).context("saving 1-day bars")?;

    info!("run completed");
    Ok(())
}

fn generate(cli: &Cli) -> Result<BarSeries<Bar>> {
    let config = load_config(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let start = cli.date.unwrap_or_else(|| Local::now().date_naive());

    info!(%start, days = cli.days, session = %config.session(), "generating simulated bars");
    Ok(generate_days(&mut rng, &config, start, cli.days))
}

fn export_intraday(original: &BarSeries<Bar>, period: Period, output_dir: &Path) -> Result<()> {
    let bars = aggregate(original, period);
    info!(%period, bars = bars.len(), "aggregated intraday bars");

    let interval = period.minutes();
    let enriched = add_moving_average(&bars, ROLLING_WINDOW_MINUTES, interval)
        .and_then(|s| add_moving_median(&s, ROLLING_WINDOW_MINUTES, interval))
        .with_context(|| format!("adding rolling statistics to {period} bars"))?;

    let file = output_dir.join(format!("ohlc_{period}_data.csv"));
    write_csv(&enriched, &file).with_context(|| format!("saving {period} bars"))?;
    Ok(())
}
