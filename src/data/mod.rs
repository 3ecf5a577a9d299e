//! Data module - CSV loading, cleaning and export

mod exporter;
mod loader;
mod model;
mod processor;

pub use exporter::{export_long, ExportError};
pub use loader::{load_long, load_raw, resolve_input, LoaderError};
pub use model::*;
pub use processor::{parse_population, parse_year, CleanError, CleanOptions, DataProcessor, MissingPolicy};
