mod config;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use pm25_core::{BoundingBox, Credential, FailureThreshold, KeyBy, Sampler, SamplingPlan};
use pm25_waqi::{WaqiClient, WaqiOptions};
use tracing::Level;

use crate::config::Settings;

/// Command line arguments for pm25-calc
#[derive(Parser, Debug)]
#[command(name = "pm25-calc")]
#[command(about = "Average PM2.5 over the air quality stations of a region")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Latitude of the first corner
    lat1: f64,
    /// Longitude of the first corner
    lng1: f64,
    /// Latitude of the opposite corner
    lat2: f64,
    /// Longitude of the opposite corner
    lng2: f64,

    /// Samples per minute [default: 5]
    #[arg(short, long)]
    frequency: Option<f64>,

    /// Sampling duration in minutes [default: 1]
    #[arg(short, long)]
    duration: Option<f64>,

    /// Label stations by name or by id [default: name]
    #[arg(long, value_enum)]
    key_by: Option<KeyArg>,

    /// WAQI API token, read from the `waqi_token` environment variable if absent
    #[arg(long)]
    token: Option<String>,

    /// Share of failed requests that aborts the run [default: 0.01]
    #[arg(long)]
    failure_threshold: Option<f64>,

    /// Root url of the WAQI API [default: https://api.waqi.info/]
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout [default: 10]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Path to a JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Log every sampling round
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KeyArg {
    Name,
    Id,
}

impl From<KeyArg> for KeyBy {
    fn from(arg: KeyArg) -> Self {
        match arg {
            KeyArg::Name => KeyBy::StationName,
            KeyArg::Id => KeyBy::StationId,
        }
    }
}

impl Args {
    fn area(&self) -> BoundingBox {
        BoundingBox::new(self.lat1, self.lng1, self.lat2, self.lng2)
    }

    /// Settings file, if any, with the command line flags applied on top.
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(frequency) = self.frequency {
            settings.frequency = frequency;
        }
        if let Some(duration) = self.duration {
            settings.duration = duration;
        }
        if let Some(key_by) = self.key_by {
            settings.key_by = key_by.into();
        }
        if let Some(ratio) = self.failure_threshold {
            settings.failure_threshold = ratio;
        }
        if let Some(base_url) = &self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            settings.timeout_secs = timeout_secs;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = args.settings()?;
    let credential = Credential::resolve(args.token.clone())?;

    // Reject bad parameters before any request goes out
    let plan = SamplingPlan::new(settings.frequency, settings.duration)?;
    let threshold = FailureThreshold::new(settings.failure_threshold)?;

    let options = WaqiOptions {
        base_url: settings.base_url.clone(),
        timeout: Duration::from_secs(settings.timeout_secs),
    };
    let client = WaqiClient::new(credential, &options)?;
    tracing::info!("Using WAQI API at {}", options.base_url);

    let sampler = Sampler::new(args.area(), client).with_failure_threshold(threshold);
    let result = sampler.run_plan(plan, settings.key_by).await?;

    if args.json {
        println!("{}", report::render_json(&result)?);
    } else {
        print!("{}", report::render_text(&result));
    }
    Ok(())
}
