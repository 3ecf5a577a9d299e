//! Pipeline Module
//! Composes load → clean → export → aggregate → render for one run.

use crate::charts::{PlotStyle, RenderError, StaticChartRenderer};
use crate::data::{
    export_long, load_raw, CleanError, CleanOptions, DataProcessor, ExportError, LoaderError,
};
use crate::stats::{AnalysisError, Filters, StatsCalculator, YearlySeries};
use log::{info, warn};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("Cleaning failed: {0}")]
    Clean(#[from] CleanError),
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Cannot create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything one run needs, already resolved from CLI and config.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub filters: Filters,
    pub clean: CleanOptions,
    pub plot_style: PlotStyle,
    /// Suffix for output file names, e.g. `20240131_154500`.
    pub timestamp: String,
}

impl RunOptions {
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("processed_fish_population_{}.csv", self.timestamp))
    }

    pub fn plot_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("population_trend_{}.png", self.timestamp))
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub raw_rows: usize,
    pub long_rows: usize,
    pub series: YearlySeries,
    pub csv_path: PathBuf,
    /// `None` when the filters left nothing to plot.
    pub plot_path: Option<PathBuf>,
}

/// Execute one pipeline run.
///
/// An empty filtered series is not a failure: the CSV is still written and
/// the plot is skipped with a warning.
pub fn run(options: &RunOptions) -> Result<RunReport, PipelineError> {
    std::fs::create_dir_all(&options.output_dir).map_err(|source| PipelineError::OutputDir {
        path: options.output_dir.clone(),
        source,
    })?;

    let raw = load_raw(&options.input)?;
    let long = DataProcessor::clean(&raw, &options.clean)?;

    let csv_path = options.csv_path();
    export_long(&long, &csv_path)?;

    let series = StatsCalculator::aggregate(&long, &options.filters)?;

    let plot_path = if series.is_empty() {
        warn!(
            "No rows match {}; skipping plot",
            options.filters.describe()
        );
        None
    } else {
        let path = options.plot_path();
        StaticChartRenderer::render_trend(&series, &options.plot_style, &path)?;
        Some(path)
    };

    info!(
        "Run complete: {} raw rows, {} long rows, {} years",
        raw.height(),
        long.height(),
        series.len()
    );

    Ok(RunReport {
        raw_rows: raw.height(),
        long_rows: long.height(),
        series,
        csv_path,
        plot_path,
    })
}
