//! Table Model Module
//! Column names and the two table shapes that flow through the pipeline.

use polars::prelude::*;

/// Identifying column headers as they appear in a FishStat capture export.
pub const RAW_COUNTRY: &str = "Country (Country)";
pub const RAW_SPECIES: &str = "ASFIS species (ASFIS species)";
pub const RAW_FISHING_AREA: &str = "FAO major fishing area (FAO major fishing area)";

pub const RAW_ID_COLUMNS: [&str; 3] = [RAW_COUNTRY, RAW_SPECIES, RAW_FISHING_AREA];

/// Long-format headers, also used verbatim in the exported CSV.
pub const COUNTRY: &str = "Country";
pub const SPECIES: &str = "Species";
pub const FISHING_AREA: &str = "Fishing_Area";
pub const YEAR: &str = "Year";
pub const POPULATION: &str = "Population";

pub const LONG_COLUMNS: [&str; 5] = [COUNTRY, SPECIES, FISHING_AREA, YEAR, POPULATION];

/// Wide capture table: identifying columns, flag columns and one text column per year.
///
/// Every column holds strings; numeric interpretation only happens once the
/// table has been unpivoted.
#[derive(Debug, Clone)]
pub struct RawTable {
    df: DataFrame,
}

impl RawTable {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Columns that are not identifying columns, i.e. year labels once flags are gone.
    pub fn value_columns(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| !RAW_ID_COLUMNS.contains(&name.as_str()))
            .collect()
    }

    /// Read a cell as text, `None` for null.
    pub fn cell(&self, column: &str, row: usize) -> Option<String> {
        self.df
            .column(column)
            .ok()
            .and_then(|col| col.str().ok())
            .and_then(|ca| ca.get(row))
            .map(str::to_string)
    }
}

/// Long capture table with the fixed schema
/// `Country, Species, Fishing_Area: String`, `Year: Int32`, `Population: Float64`.
///
/// Year and Population are either numeric or null.
#[derive(Debug, Clone)]
pub struct LongTable {
    df: DataFrame,
}

/// One row of a [`LongTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub country: Option<String>,
    pub species: Option<String>,
    pub fishing_area: Option<String>,
    pub year: Option<i32>,
    pub population: Option<f64>,
}

impl LongTable {
    /// Build a long table from a frame holding the five long columns.
    ///
    /// Columns are reordered to the canonical layout and cast to the canonical
    /// dtypes; extra columns are discarded.
    pub fn try_new(df: DataFrame) -> PolarsResult<Self> {
        let selected = df.select(LONG_COLUMNS)?;
        let columns = vec![
            selected.column(COUNTRY)?.cast(&DataType::String)?,
            selected.column(SPECIES)?.cast(&DataType::String)?,
            selected.column(FISHING_AREA)?.cast(&DataType::String)?,
            selected.column(YEAR)?.cast(&DataType::Int32)?,
            selected.column(POPULATION)?.cast(&DataType::Float64)?,
        ];
        Ok(Self {
            df: DataFrame::new(columns)?,
        })
    }

    /// Assemble a long table from row-aligned column vectors.
    pub fn from_columns(
        countries: Vec<Option<String>>,
        species: Vec<Option<String>>,
        areas: Vec<Option<String>>,
        years: Vec<Option<i32>>,
        populations: Vec<Option<f64>>,
    ) -> PolarsResult<Self> {
        let df = DataFrame::new(vec![
            Column::new(COUNTRY.into(), countries),
            Column::new(SPECIES.into(), species),
            Column::new(FISHING_AREA.into(), areas),
            Column::new(YEAR.into(), years),
            Column::new(POPULATION.into(), populations),
        ])?;
        Ok(Self { df })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Materialize the table as records, mostly useful for inspection and tests.
    pub fn records(&self) -> PolarsResult<Vec<LongRecord>> {
        let countries = self.df.column(COUNTRY)?.str()?;
        let species = self.df.column(SPECIES)?.str()?;
        let areas = self.df.column(FISHING_AREA)?.str()?;
        let years = self.df.column(YEAR)?.i32()?;
        let populations = self.df.column(POPULATION)?.f64()?;

        Ok((0..self.df.height())
            .map(|i| LongRecord {
                country: countries.get(i).map(str::to_string),
                species: species.get(i).map(str::to_string),
                fishing_area: areas.get(i).map(str::to_string),
                year: years.get(i),
                population: populations.get(i),
            })
            .collect())
    }

    /// Sorted distinct values of a text column, nulls skipped.
    pub fn unique_values(&self, column: &str) -> Vec<String> {
        let Ok(ca) = self.df.column(column).and_then(|c| c.str()) else {
            return Vec::new();
        };
        let mut values: Vec<String> = ca.into_iter().flatten().map(str::to_string).collect();
        values.sort();
        values.dedup();
        values
    }

    /// Frame equality treating nulls in the same position as equal.
    pub fn same_contents(&self, other: &LongTable) -> bool {
        self.df.equals_missing(&other.df)
    }
}
