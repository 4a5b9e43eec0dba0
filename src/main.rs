//! # Tide Windows Application Entry Point
//!
//! This binary wires the pieces together: load configuration, fetch tide
//! events (falling back to the offline model when the provider fails),
//! run the core pipeline, and print or export the result.


use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use tide_windows_lib::{
    config::Config,
    export, fallback,
    renderer::draw_ascii,
    tide_data::{self, TideSource, WillyWeatherSource},
    DateRange, TideEvent,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Boatable tide windows for a single boat ramp
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "tide-config.toml")]
    config: PathBuf,

    /// First day to forecast (YYYY-MM-DD); defaults to today at the station
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Number of days to forecast
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Minimum tide height in metres, overriding the config file
    #[arg(long)]
    threshold: Option<f64>,

    /// Also write the day rows to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the forecast as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Skip the provider and use the approximate tide model
    #[arg(long)]
    offline: bool,
}

/// Fetch events from the provider, or from the offline model when asked to
/// or when the provider fails. Returns whether the data is approximate.
async fn load_events(
    cli: &Cli,
    config: &Config,
    range: DateRange,
) -> anyhow::Result<(Vec<TideEvent>, bool)> {
    let offline = fallback::OfflineSource {
        timezone: config.location.timezone,
    };

    if cli.offline {
        let events = offline.fetch_events(range).await?;
        return Ok((events, true));
    }

    let source = WillyWeatherSource::new(config).context("building HTTP client")?;
    match source.fetch_events(range).await {
        Ok(events) => Ok((events, false)),
        Err(err @ tide_data::FetchError::InvalidRange { .. }) => Err(err.into()),
        Err(err) => {
            // Continue with synthetic data rather than failing outright
            warn!(error = %err, "tide data fetch failed, falling back to offline model");
            let events = offline.fetch_events(range).await?;
            Ok((events, true))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_from_path(&cli.config);
    if let Some(threshold) = cli.threshold {
        config.window.threshold_m = threshold;
    }
    config.window.validate()?;

    let start = cli.start.unwrap_or_else(|| {
        Utc::now()
            .with_timezone(&config.location.timezone)
            .date_naive()
    });
    let range = DateRange::new(start, cli.days);
    tide_data::check_range(range)?;

    // Create Tokio runtime for the provider fetch
    let rt = tokio::runtime::Runtime::new()?;
    let (events, offline) = rt.block_on(load_events(&cli, &config, range))?;

    let forecast = tide_windows_lib::predict(&events, &config.window, range)
        .with_context(|| format!("computing windows for {} day(s) from {start}", range.days))?;
    info!(
        days = forecast.days.len(),
        best_day = ?forecast.overall.best_day,
        offline,
        "forecast ready"
    );

    if let Some(path) = &cli.csv {
        export::write_csv(path, &forecast)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
    } else {
        draw_ascii(&forecast, &config, offline);
    }

    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    run(Cli::parse())
}
