//! Fetches daily measurements for every sensor near the configured coordinate,
//! prints a summary of the resulting table and optionally exports or plots it.
//!
//! The API key is read from `OPENAQ_API_KEY`, either in the environment or in
//! a `.env` file in the working directory.
//!
//! OPENAQ_API_KEY=... cargo run --bin openaq_daily --features plot -- --plot

use argh::FromArgs;
use log::{error, info, warn};
use openaq::{plot_daily, write_csv, OpenAq, OpenAqError, RunStatus, Settings};
use std::error::Error;
use std::path::PathBuf;

/// Collect daily OpenAQ measurements for the sensors around a coordinate.
#[derive(FromArgs, Debug)]
struct Args {
    /// configuration file (default: ./openaq.{toml,yaml,json} if present)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// write the measurement table to this CSV file
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// sensor fetches in flight at once (overrides the configuration)
    #[argh(option)]
    concurrency: Option<usize>,

    /// render a chart of the daily values per sensor
    #[argh(switch)]
    plot: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(concurrency) = args.concurrency {
        settings.pipeline.concurrency = concurrency;
    }
    let city = settings.pipeline.city.clone();

    let client = match OpenAq::new(settings) {
        Ok(client) => client,
        Err(OpenAqError::MissingCredential) => {
            error!("OPENAQ_API_KEY not found in the environment, .env or configuration.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let report = match client.run().await {
        Ok(report) => report,
        Err(e @ OpenAqError::Resolve(_)) => {
            error!("Error fetching locations: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for (sensor_id, e) in report.aggregation.failures() {
        warn!("Skipped sensor {}: {}", sensor_id, e);
    }

    match report.status() {
        RunStatus::Empty(reason) => {
            info!("Nothing to show: {:?}", reason);
            return Ok(());
        }
        status => info!("Run finished: {:?}", status),
    }

    let mut frame = report.to_frame()?;
    println!("{}", frame.head(Some(5)));
    println!("DataFrame shape: {:?}", frame.shape());

    if let Some(path) = args.output.as_deref() {
        write_csv(&mut frame, path)?;
        info!("Wrote {} rows to {}", frame.height(), path.display());
    }

    if args.plot {
        plot_daily(&report.rows, &report.plot_labels(&city))?;
    }

    Ok(())
}
