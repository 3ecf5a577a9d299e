//! CSV Data Loader Module
//! Handles CSV loading and identifying-column validation using Polars.

use crate::data::model::{
    LongTable, RawTable, COUNTRY, FISHING_AREA, LONG_COLUMNS, POPULATION, RAW_ID_COLUMNS, SPECIES,
    YEAR,
};
use crate::data::processor::{parse_population, parse_year};
use log::{debug, info};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("{} is missing required column(s): {}", .path.display(), .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
}

/// Read a delimited file with every column kept as text.
///
/// Schema inference is disabled so that sentinel markers such as `.` survive
/// loading untouched and are handled by the cleaner.
fn read_text_csv(path: &Path) -> Result<DataFrame, LoaderError> {
    std::fs::metadata(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn missing_columns(df: &DataFrame, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| df.get_column_index(name).is_none())
        .map(|name| name.to_string())
        .collect()
}

/// Load a wide capture export and validate its identifying columns.
pub fn load_raw(path: &Path) -> Result<RawTable, LoaderError> {
    let df = read_text_csv(path)?;

    let missing = missing_columns(&df, &RAW_ID_COLUMNS);
    if !missing.is_empty() {
        return Err(LoaderError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    info!(
        "Loaded {} rows, {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(RawTable::new(df))
}

/// Reload a long table previously written by the exporter.
///
/// Year and Population go through the same lenient parsing as cleaning, so
/// anything non-numeric comes back as null.
pub fn load_long(path: &Path) -> Result<LongTable, LoaderError> {
    let df = read_text_csv(path)?;

    let missing = missing_columns(&df, &LONG_COLUMNS);
    if !missing.is_empty() {
        return Err(LoaderError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let text = |name: &str| -> Result<Vec<Option<String>>, LoaderError> {
        Ok(df
            .column(name)?
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    };

    let years = df
        .column(YEAR)?
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_year))
        .collect();
    let populations = df
        .column(POPULATION)?
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_population))
        .collect();

    let table = LongTable::from_columns(
        text(COUNTRY)?,
        text(SPECIES)?,
        text(FISHING_AREA)?,
        years,
        populations,
    )?;

    info!("Loaded {} long rows from {}", table.height(), path.display());
    Ok(table)
}

/// Resolve the input path, falling back to `data_dir` for relative paths
/// that do not exist as given.
pub fn resolve_input(path: &Path, data_dir: &Path) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = data_dir.join(path);
    if candidate.exists() {
        debug!("Resolved {} under data dir {}", path.display(), data_dir.display());
        candidate
    } else {
        path.to_path_buf()
    }
}
