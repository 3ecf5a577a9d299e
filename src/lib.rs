//! FishStat Trends - capture data cleaning, yearly aggregation & trend plots
//!
//! Pipeline: load a wide FishStat export, drop flag columns, replace missing
//! markers, unpivot to one row per (country, species, area, year), aggregate
//! per year under optional filters, then plot and export.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod pipeline;
pub mod stats;
