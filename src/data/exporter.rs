//! CSV Exporter Module
//! Writes the cleaned long table to disk.

use crate::data::model::LongTable;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Write the long table as CSV with header
/// `Country,Species,Fishing_Area,Year,Population`. Nulls become empty fields.
pub fn export_long(table: &LongTable, path: &Path) -> Result<(), ExportError> {
    let mut file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut df = table.dataframe().clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    info!("Exported {} rows to {}", df.height(), path.display());
    Ok(())
}
