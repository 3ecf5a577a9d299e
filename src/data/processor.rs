//! Data Processor Module
//! Handles data cleaning and transformation (flag drop, marker replacement, unpivot).

use crate::data::model::{
    LongTable, RawTable, RAW_COUNTRY, RAW_FISHING_AREA, RAW_ID_COLUMNS, RAW_SPECIES,
};
use log::{debug, info};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// What a missing-value marker is replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Marker becomes `0`, so missing data counts as zero capture
    Zero,
    /// Marker becomes null and is left out of every statistic
    #[serde(alias = "missing")]
    Null,
}

impl Default for MissingPolicy {
    fn default() -> Self {
        MissingPolicy::Zero
    }
}

/// Settings for one cleaning pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOptions {
    pub flag_prefix: String,
    pub missing_markers: Vec<String>,
    pub missing_policy: MissingPolicy,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            flag_prefix: "S".to_string(),
            missing_markers: vec![".".to_string(), String::new(), "NA".to_string()],
            missing_policy: MissingPolicy::default(),
        }
    }
}

/// Parse a year label leniently.
///
/// Surrounding whitespace and brackets are ignored (`[1950]` is 1950) and an
/// integral float such as `1950.0` is accepted. Anything else is `None`.
pub fn parse_year(label: &str) -> Option<i32> {
    let trimmed = label
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .filter(|v| *v >= i32::MIN as f64 && *v <= i32::MAX as f64)
        .map(|v| v as i32)
}

/// Parse a population cell leniently; non-numeric and non-finite values are `None`.
pub fn parse_population(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Handles data cleaning and transformation operations.
///
/// Every step takes a table by reference and returns a new one.
pub struct DataProcessor;

impl DataProcessor {
    /// Drop every column whose name starts with `prefix`.
    ///
    /// Identifying columns are always kept. An empty prefix drops nothing.
    pub fn drop_flag_columns(table: &RawTable, prefix: &str) -> Result<RawTable, CleanError> {
        let names = table.column_names();
        let keep: Vec<String> = names
            .iter()
            .filter(|name| {
                prefix.is_empty()
                    || !name.starts_with(prefix)
                    || RAW_ID_COLUMNS.contains(&name.as_str())
            })
            .cloned()
            .collect();

        debug!(
            "Dropping {} flag column(s) with prefix {:?}",
            names.len() - keep.len(),
            prefix
        );
        Ok(RawTable::new(table.dataframe().select(keep)?))
    }

    /// Replace every configured marker, and every null cell, in every column.
    pub fn replace_missing_markers(
        table: &RawTable,
        markers: &[String],
        policy: MissingPolicy,
    ) -> Result<RawTable, CleanError> {
        let replacement: Option<String> = match policy {
            MissingPolicy::Zero => Some("0".to_string()),
            MissingPolicy::Null => None,
        };

        let mut replaced = 0usize;
        let mut columns = Vec::with_capacity(table.dataframe().width());
        for column in table.dataframe().get_columns() {
            let text = column.cast(&DataType::String)?;
            let values: Vec<Option<String>> = text
                .str()?
                .into_iter()
                .map(|cell| match cell {
                    Some(v) if !markers.iter().any(|m| m == v) => Some(v.to_string()),
                    _ => {
                        replaced += 1;
                        replacement.clone()
                    }
                })
                .collect();
            columns.push(Column::new(column.name().clone(), values));
        }

        debug!("Replaced {} missing cell(s) using {:?}", replaced, policy);
        Ok(RawTable::new(DataFrame::new(columns)?))
    }

    /// Transform wide year columns to long format (stack operation).
    ///
    /// Output rows are ordered year column first, then input row, so the
    /// result has `rows x year_columns` rows.
    pub fn unpivot(table: &RawTable) -> Result<LongTable, CleanError> {
        let df = table.dataframe();
        let year_cols = table.value_columns();
        let n = df.height() * year_cols.len();

        let ids = |name: &str| -> Result<Vec<Option<String>>, CleanError> {
            Ok(df
                .column(name)?
                .cast(&DataType::String)?
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect())
        };
        let country_ids = ids(RAW_COUNTRY)?;
        let species_ids = ids(RAW_SPECIES)?;
        let area_ids = ids(RAW_FISHING_AREA)?;

        let mut countries: Vec<Option<String>> = Vec::with_capacity(n);
        let mut species: Vec<Option<String>> = Vec::with_capacity(n);
        let mut areas: Vec<Option<String>> = Vec::with_capacity(n);
        let mut years: Vec<Option<i32>> = Vec::with_capacity(n);
        let mut populations: Vec<Option<f64>> = Vec::with_capacity(n);

        for year_col in &year_cols {
            let year = parse_year(year_col);
            let cells = df.column(year_col)?.cast(&DataType::String)?;
            let cells = cells.str()?;

            for (i, cell) in cells.into_iter().enumerate() {
                countries.push(country_ids[i].clone());
                species.push(species_ids[i].clone());
                areas.push(area_ids[i].clone());
                years.push(year);
                populations.push(cell.and_then(parse_population));
            }
        }

        Ok(LongTable::from_columns(
            countries,
            species,
            areas,
            years,
            populations,
        )?)
    }

    /// Run the full cleaning pass on a freshly loaded table.
    pub fn clean(table: &RawTable, options: &CleanOptions) -> Result<LongTable, CleanError> {
        let without_flags = Self::drop_flag_columns(table, &options.flag_prefix)?;
        let filled = Self::replace_missing_markers(
            &without_flags,
            &options.missing_markers,
            options.missing_policy,
        )?;
        let long = Self::unpivot(&filled)?;

        info!(
            "Cleaned {} rows x {} year columns into {} long rows",
            filled.height(),
            filled.value_columns().len(),
            long.height()
        );
        Ok(long)
    }

    /// Re-apply cleaning to a table that is already in long format.
    ///
    /// Year and Population are numeric or null by construction, so this only
    /// restores the canonical column order and dtypes.
    pub fn normalize_long(table: &LongTable) -> Result<LongTable, CleanError> {
        Ok(LongTable::try_new(table.dataframe().clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{POPULATION, YEAR};

    fn text_col(name: &str, values: &[Option<&str>]) -> Column {
        let owned: Vec<Option<String>> = values.iter().map(|v| v.map(str::to_string)).collect();
        Column::new(name.into(), owned)
    }

    fn raw_table() -> RawTable {
        RawTable::new(
            DataFrame::new(vec![
                text_col(RAW_COUNTRY, &[Some("Norway"), Some("Chile"), Some("Norway")]),
                text_col(RAW_SPECIES, &[Some("FCY"), Some("ANE"), Some("COD")]),
                text_col(RAW_FISHING_AREA, &[Some("27"), Some("87"), Some("27")]),
                text_col("[2000]", &[Some("10"), Some("NA"), Some("7")]),
                text_col("S", &[None, Some("E"), None]),
                text_col("[2001]", &[Some("."), Some("5"), None]),
                text_col("S_duplicated_0", &[Some("F"), None, None]),
                text_col("[2002]", &[Some("12.5"), Some("abc"), Some("3")]),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_parse_year_variants() {
        assert_eq!(parse_year("1950"), Some(1950));
        assert_eq!(parse_year(" [1950] "), Some(1950));
        assert_eq!(parse_year("1950.0"), Some(1950));
        assert_eq!(parse_year("1950.5"), None);
        assert_eq!(parse_year("Unit"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_parse_population_variants() {
        assert_eq!(parse_population("12.5"), Some(12.5));
        assert_eq!(parse_population(" 0 "), Some(0.0));
        assert_eq!(parse_population("."), None);
        assert_eq!(parse_population("NaN"), None);
        assert_eq!(parse_population("inf"), None);
    }

    #[test]
    fn test_drop_flag_columns_keeps_identifiers() {
        let dropped = DataProcessor::drop_flag_columns(&raw_table(), "S").unwrap();
        assert_eq!(
            dropped.column_names(),
            vec![RAW_COUNTRY, RAW_SPECIES, RAW_FISHING_AREA, "[2000]", "[2001]", "[2002]"]
        );
        assert_eq!(dropped.value_columns(), vec!["[2000]", "[2001]", "[2002]"]);
    }

    #[test]
    fn test_drop_and_replace_are_idempotent() {
        let markers = CleanOptions::default().missing_markers;
        for policy in [MissingPolicy::Zero, MissingPolicy::Null] {
            let once = DataProcessor::drop_flag_columns(&raw_table(), "S").unwrap();
            let twice = DataProcessor::drop_flag_columns(&once, "S").unwrap();
            assert!(once.dataframe().equals_missing(twice.dataframe()));

            let once = DataProcessor::replace_missing_markers(&once, &markers, policy).unwrap();
            let twice = DataProcessor::replace_missing_markers(&once, &markers, policy).unwrap();
            assert!(once.dataframe().equals_missing(twice.dataframe()));
        }
    }

    #[test]
    fn test_no_marker_survives_replacement() {
        let options = CleanOptions::default();
        let table = DataProcessor::drop_flag_columns(&raw_table(), "S").unwrap();
        let table = DataProcessor::replace_missing_markers(
            &table,
            &options.missing_markers,
            MissingPolicy::Zero,
        )
        .unwrap();

        for name in table.column_names() {
            for row in 0..table.height() {
                let cell = table.cell(&name, row);
                assert!(cell.is_some(), "null survived in {name}[{row}]");
                let cell = cell.unwrap();
                assert!(
                    !options.missing_markers.contains(&cell),
                    "marker {cell:?} survived in {name}[{row}]"
                );
            }
        }
    }

    #[test]
    fn test_clean_row_count_law() {
        let raw = raw_table();
        let long = DataProcessor::clean(&raw, &CleanOptions::default()).unwrap();
        assert_eq!(long.height(), raw.height() * 3);
    }

    #[test]
    fn test_clean_zero_policy_values() {
        let long = DataProcessor::clean(&raw_table(), &CleanOptions::default()).unwrap();
        let records = long.records().unwrap();

        // year-major ordering: [2000] rows, then [2001] rows, then [2002] rows
        let years: Vec<Option<i32>> = records.iter().map(|r| r.year).collect();
        assert_eq!(
            years,
            vec![
                Some(2000), Some(2000), Some(2000),
                Some(2001), Some(2001), Some(2001),
                Some(2002), Some(2002), Some(2002),
            ]
        );
        let pops: Vec<Option<f64>> = records.iter().map(|r| r.population).collect();
        assert_eq!(
            pops,
            vec![
                Some(10.0), Some(0.0), Some(7.0),
                Some(0.0), Some(5.0), Some(0.0),
                Some(12.5), None, Some(3.0),
            ]
        );
        assert_eq!(records[1].country.as_deref(), Some("Chile"));
        assert_eq!(records[1].species.as_deref(), Some("ANE"));
        assert_eq!(records[1].fishing_area.as_deref(), Some("87"));
    }

    #[test]
    fn test_clean_null_policy_keeps_missing_distinct() {
        let options = CleanOptions {
            missing_policy: MissingPolicy::Null,
            ..CleanOptions::default()
        };
        let long = DataProcessor::clean(&raw_table(), &options).unwrap();
        let pops: Vec<Option<f64>> = long.records().unwrap().iter().map(|r| r.population).collect();
        assert_eq!(pops[1], None);
        assert_eq!(pops[3], None);
        assert_eq!(pops[5], None);
        assert_eq!(pops[0], Some(10.0));
    }

    #[test]
    fn test_clean_schema() {
        let long = DataProcessor::clean(&raw_table(), &CleanOptions::default()).unwrap();
        let df = long.dataframe();
        assert_eq!(df.column(YEAR).unwrap().dtype(), &DataType::Int32);
        assert_eq!(df.column(POPULATION).unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_normalize_long_is_identity_on_clean_output() {
        let long = DataProcessor::clean(&raw_table(), &CleanOptions::default()).unwrap();
        let again = DataProcessor::normalize_long(&long).unwrap();
        let third = DataProcessor::normalize_long(&again).unwrap();
        assert!(long.same_contents(&again));
        assert!(again.same_contents(&third));
    }

    #[test]
    fn test_unparseable_year_column_yields_missing_year() {
        let raw = RawTable::new(
            DataFrame::new(vec![
                text_col(RAW_COUNTRY, &[Some("Norway")]),
                text_col(RAW_SPECIES, &[Some("FCY")]),
                text_col(RAW_FISHING_AREA, &[Some("27")]),
                text_col("Unit (Name)", &[Some("Tonnes")]),
            ])
            .unwrap(),
        );
        let records = DataProcessor::clean(&raw, &CleanOptions::default())
            .unwrap()
            .records()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, None);
        assert_eq!(records[0].population, None);
    }
}
