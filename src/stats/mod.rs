//! Stats module - Filtering and per-year aggregation

mod calculator;

pub use calculator::{AnalysisError, Filters, StatsCalculator, YearlyAggregate, YearlySeries};
