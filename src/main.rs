//! FishStat Trends - command line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use fishstat_trends::cli::Cli;
use fishstat_trends::config::Config;
use fishstat_trends::{logging, pipeline};
use log::{error, info, warn};
use std::process::ExitCode;

const LOG_FILE: &str = "fishstat_trends.log";

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;

    let output_dir = cli.resolved_output_dir(&config);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    logging::init(Some(&output_dir.join(LOG_FILE)))?;
    if !cli.config.exists() {
        warn!("Config {} not found, using built-in defaults", cli.config.display());
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let options = cli.into_options(&config, timestamp);
    info!(
        "Analyzing {} ({})",
        options.input.display(),
        options.filters.describe()
    );

    let report = pipeline::run(&options)
        .with_context(|| format!("processing {}", options.input.display()))?;

    println!("Processed data saved to {}", report.csv_path.display());
    match &report.plot_path {
        Some(path) => println!("Trend plot saved to {}", path.display()),
        None => println!("No data matched the filters; no plot written"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if log::log_enabled!(log::Level::Error) {
                error!("{e:#}");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
