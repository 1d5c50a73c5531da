use std::cmp::Ordering;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::process::table::RawTable;

/// Leading metadata columns in the indicator files: Country Name, Country
/// Code, Indicator Name, Indicator Code. Everything after them is a year.
pub const IDENTITY_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRow {
    pub country: String,
    /// One value per entry of [`Dataset::years`]; `None` where the source had
    /// no usable number.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    /// Year labels, oldest first.
    pub years: Vec<String>,
    pub rows: Vec<CountryRow>,
}

impl Dataset {
    pub fn empty() -> Self {
        Dataset {
            years: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn year_index(&self, year: &str) -> Option<usize> {
        self.years.iter().position(|y| y == year)
    }

    /// Descending by the given year's value. Rows missing that value land
    /// after every row that has one; the sort is stable, so ties keep their
    /// original relative order.
    fn sort_by_year(&mut self, year: &str) {
        let Some(idx) = self.year_index(year) else {
            return;
        };
        self.rows.sort_by(|a, b| match (a.values[idx], b.values[idx]) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}

/// Join the two indicator tables into the publishable pair of datasets.
///
/// Returns the absolute emissions table, the per-capita table (emissions over
/// population, cell-wise, aligned by row position), and the chosen reference
/// year. Both outputs are sorted descending by that year.
pub fn preprocess(
    population: &RawTable,
    emissions: &RawTable,
    missing_threshold: usize,
) -> Result<(Dataset, Dataset, String)> {
    let years = year_columns(emissions);
    if years.is_empty() {
        bail!("emissions table has no year columns");
    }

    let reference_year = select_reference_year(population, emissions, &years, missing_threshold);
    let year_labels: Vec<String> = years.iter().map(|(_, label)| label.clone()).collect();

    // The two files share one upstream schema, but index population by header
    // name anyway rather than trusting column positions across downloads.
    let population_cols: Vec<Option<usize>> = years
        .iter()
        .map(|(_, label)| population.column_index(label))
        .collect();

    let mut absolute = Dataset {
        years: year_labels.clone(),
        rows: Vec::with_capacity(emissions.num_rows()),
    };
    let mut per_capita = Dataset {
        years: year_labels,
        rows: Vec::with_capacity(emissions.num_rows()),
    };

    for row in 0..emissions.num_rows() {
        let country = emissions.cell(row, 0).unwrap_or_default().to_string();

        let absolute_values: Vec<Option<f64>> = years
            .iter()
            .map(|(col, _)| emissions.numeric_cell(row, *col))
            .collect();

        let per_capita_values: Vec<Option<f64>> = absolute_values
            .iter()
            .zip(&population_cols)
            .map(|(emitted, population_col)| {
                let emitted = (*emitted)?;
                let people = population.numeric_cell(row, (*population_col)?)?;
                (people != 0.0).then(|| emitted / people)
            })
            .collect();

        absolute.rows.push(CountryRow {
            country: country.clone(),
            values: absolute_values,
        });
        per_capita.rows.push(CountryRow {
            country,
            values: per_capita_values,
        });
    }

    absolute.sort_by_year(&reference_year);
    per_capita.sort_by_year(&reference_year);

    Ok((absolute, per_capita, reference_year))
}

/// `(column index, label)` of every year column, oldest first. All-digit
/// header names past the identity block count as years; this also skips the
/// empty header the upstream trailing comma produces.
fn year_columns(table: &RawTable) -> Vec<(usize, String)> {
    table
        .headers
        .iter()
        .enumerate()
        .skip(IDENTITY_COLUMNS)
        .filter(|(_, name)| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
        .map(|(col, name)| (col, name.clone()))
        .collect()
}

/// Most recent year in which both tables stay under the missing-value bound;
/// if none does, the most recent year wins regardless.
fn select_reference_year(
    population: &RawTable,
    emissions: &RawTable,
    years: &[(usize, String)],
    missing_threshold: usize,
) -> String {
    for (col, label) in years.iter().rev() {
        let population_missing = match population.column_index(label) {
            Some(pop_col) => missing_in_column(population, pop_col),
            None => population.num_rows(),
        };
        if population_missing < missing_threshold
            && missing_in_column(emissions, *col) < missing_threshold
        {
            return label.clone();
        }
    }
    years.last().expect("years is non-empty").1.clone()
}

fn missing_in_column(table: &RawTable, col: usize) -> usize {
    (0..table.num_rows())
        .filter(|&row| table.numeric_cell(row, col).is_none())
        .count()
}
