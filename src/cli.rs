//! Command line surface.

use crate::config::Config;
use crate::pipeline::RunOptions;
use crate::stats::Filters;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fishstat-trends")]
#[command(about = "Clean FishStat capture data and plot yearly trends", long_about = None)]
pub struct Cli {
    /// Input CSV (wide FishStat capture export)
    pub input: PathBuf,

    /// Config file (YAML, or JSON with a .json extension)
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Species code to analyze (exact match)
    #[arg(short, long)]
    pub species: Option<String>,

    /// Country to analyze (exact match)
    #[arg(long)]
    pub country: Option<String>,

    /// First year to include
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year to include
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Output directory for the plot, CSV and run log (default: output)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Do not draw the confidence band
    #[arg(long, default_value_t = false)]
    pub no_band: bool,
}

impl Cli {
    /// Output directory: flag first, then config.
    pub fn resolved_output_dir(&self, config: &Config) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| config.output_dir.clone())
    }

    /// Merge flags over config values into run options.
    pub fn into_options(self, config: &Config, timestamp: String) -> RunOptions {
        let output_dir = self.resolved_output_dir(config);
        let input = crate::data::resolve_input(&self.input, &config.data_dir);

        let filters = Filters {
            species: self.species.or_else(|| config.default_species.clone()),
            country: self.country.or_else(|| config.default_country.clone()),
            start_year: self.start_year.or(config.start_year),
            end_year: self.end_year.or(config.end_year),
        };

        let mut plot_style = config.plot_style.clone();
        if self.no_band {
            plot_style.confidence_band = false;
        }

        RunOptions {
            input,
            output_dir,
            filters,
            clean: config.clean_options(),
            plot_style,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["fishstat-trends", "capture.csv"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("capture.csv"));
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(cli.species.is_none());
        assert!(!cli.no_band);

        let opts = cli.into_options(&Config::default(), "ts".to_string());
        assert_eq!(opts.output_dir, PathBuf::from("output"));
        assert_eq!(opts.filters, Filters::default());
        assert!(opts.plot_style.confidence_band);
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            default_species: Some("FCY".into()),
            start_year: Some(1990),
            end_year: Some(2000),
            output_dir: PathBuf::from("from_config"),
            ..Config::default()
        };
        let cli = Cli::try_parse_from([
            "fishstat-trends",
            "capture.csv",
            "--species",
            "ANE",
            "--country",
            "Chile",
            "--end-year",
            "2010",
            "--output-dir",
            "out",
            "--no-band",
        ])
        .unwrap();

        let opts = cli.into_options(&config, "20240101_000000".to_string());
        assert_eq!(opts.filters.species.as_deref(), Some("ANE"));
        assert_eq!(opts.filters.country.as_deref(), Some("Chile"));
        assert_eq!(opts.filters.start_year, Some(1990));
        assert_eq!(opts.filters.end_year, Some(2010));
        assert_eq!(opts.output_dir, PathBuf::from("out"));
        assert!(!opts.plot_style.confidence_band);
        assert_eq!(
            opts.csv_path(),
            PathBuf::from("out/processed_fish_population_20240101_000000.csv")
        );
    }

    #[test]
    fn test_config_output_dir_used_without_flag() {
        let config = Config {
            output_dir: PathBuf::from("from_config"),
            ..Config::default()
        };
        let cli = Cli::try_parse_from(["fishstat-trends", "x.csv"]).unwrap();
        assert_eq!(cli.resolved_output_dir(&config), PathBuf::from("from_config"));
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["fishstat-trends"]).is_err());
    }
}
