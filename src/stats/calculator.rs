//! Statistics Calculator Module
//! Handles filtering of the long table and per-year aggregation.

use crate::data::{LongTable, COUNTRY, POPULATION, SPECIES, YEAR};
use log::{debug, info};
use polars::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Row filters; every present filter must match (AND), absent ones match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub species: Option<String>,
    pub country: Option<String>,
    /// Inclusive lower bound.
    pub start_year: Option<i32>,
    /// Inclusive upper bound.
    pub end_year: Option<i32>,
}

impl Filters {
    /// Human readable label for plots and log lines.
    pub fn describe(&self) -> String {
        let mut parts = vec![self
            .species
            .clone()
            .unwrap_or_else(|| "All species".to_string())];
        if let Some(country) = &self.country {
            parts.push(country.clone());
        }
        match (self.start_year, self.end_year) {
            (Some(start), Some(end)) => parts.push(format!("{}-{}", start, end)),
            (Some(start), None) => parts.push(format!("from {}", start)),
            (None, Some(end)) => parts.push(format!("until {}", end)),
            (None, None) => {}
        }
        parts.join(" / ")
    }

    fn predicate(&self) -> Expr {
        let mut predicate = col(YEAR).is_not_null();
        if let Some(species) = &self.species {
            predicate = predicate.and(col(SPECIES).eq(lit(species.as_str())));
        }
        if let Some(country) = &self.country {
            predicate = predicate.and(col(COUNTRY).eq(lit(country.as_str())));
        }
        if let Some(start) = self.start_year {
            predicate = predicate.and(col(YEAR).gt_eq(lit(start)));
        }
        if let Some(end) = self.end_year {
            predicate = predicate.and(col(YEAR).lt_eq(lit(end)));
        }
        predicate
    }
}

/// Statistics for a single year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyAggregate {
    pub year: i32,
    pub sum: f64,
    pub mean: f64,
    /// Sample standard deviation, NaN with fewer than two values.
    pub std_dev: f64,
    /// Number of non-missing population values.
    pub count: usize,
}

/// Aggregates for every year that survived filtering, ascending by year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlySeries {
    pub label: String,
    pub points: Vec<YearlyAggregate>,
}

impl YearlySeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, year: i32) -> Option<&YearlyAggregate> {
        self.points.iter().find(|p| p.year == year)
    }

    /// Inclusive (first, last) year, `None` for an empty series.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        Some((self.points.first()?.year, self.points.last()?.year))
    }
}

/// Handles statistical calculations over the long table.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute sum, mean, sample std and count for one year's values.
    pub fn compute_year_stats(year: i32, values: &[f64]) -> YearlyAggregate {
        let n = values.len();
        let sum = values.iter().sum::<f64>();
        let mean = if n == 0 { f64::NAN } else { sum / n as f64 };

        let std_dev = if n > 1 {
            let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            f64::NAN
        };

        YearlyAggregate {
            year,
            sum,
            mean,
            std_dev,
            count: n,
        }
    }

    /// Get (year, population) pairs for rows matching the filters.
    pub fn filtered_values(
        table: &LongTable,
        filters: &Filters,
    ) -> Result<Vec<(i32, Option<f64>)>, AnalysisError> {
        let filtered = table
            .dataframe()
            .clone()
            .lazy()
            .filter(filters.predicate())
            .select([col(YEAR), col(POPULATION)])
            .collect()?;

        let years = filtered.column(YEAR)?.i32()?;
        let populations = filtered.column(POPULATION)?.f64()?;

        Ok(years
            .into_iter()
            .zip(populations.into_iter())
            .filter_map(|(year, pop)| year.map(|y| (y, pop)))
            .collect())
    }

    /// Filter the long table and aggregate population per year.
    ///
    /// No surviving rows is not an error: the returned series is empty.
    pub fn aggregate(table: &LongTable, filters: &Filters) -> Result<YearlySeries, AnalysisError> {
        let rows = Self::filtered_values(table, filters)?;

        let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for (year, pop) in &rows {
            let values = by_year.entry(*year).or_default();
            if let Some(p) = pop {
                values.push(*p);
            }
        }

        let points: Vec<YearlyAggregate> = by_year
            .iter()
            .map(|(year, values)| Self::compute_year_stats(*year, values))
            .collect();

        for p in &points {
            debug!(
                "{}: sum={:.3} mean={:.3} std={:.3} n={}",
                p.year, p.sum, p.mean, p.std_dev, p.count
            );
        }
        info!(
            "Aggregated {} rows into {} years for {}",
            rows.len(),
            points.len(),
            filters.describe()
        );

        Ok(YearlySeries {
            label: filters.describe(),
            points,
        })
    }
}
