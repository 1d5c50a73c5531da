use crate::error::FetchError;

/// Banner lines the upstream source emits ahead of the CSV header row.
pub const PREAMBLE_LINES: usize = 4;

/// A decoded indicator file: the header row plus every data row as strings.
/// Rows may be shorter than the header when trailing cells are absent; the
/// accessors below treat those the same as empty cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names, as the file claims them.
    pub headers: Vec<String>,
    /// Each data row, one field per cell.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Non-empty cell content, or `None` for empty, whitespace, or
    /// out-of-range cells.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        let value = self.rows.get(row)?.get(col)?.trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn numeric_cell(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col)?.parse().ok()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Parse decoded indicator text into a [`RawTable`], dropping the fixed
/// banner first. Missing cells stay missing rather than failing the row.
pub fn parse_table(text: &str) -> Result<RawTable, FetchError> {
    let body = text
        .lines()
        .skip(PREAMBLE_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}
