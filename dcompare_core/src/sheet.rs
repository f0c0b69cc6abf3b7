use crate::matcher::round2;
use calamine::{open_workbook_auto, Data, Range, Reader};
use dcompare_common::{DCompareError, DocumentFormat};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A single spreadsheet cell.
///
/// Missing cells are `Empty`, and two `Empty` cells are equal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(String),
    Error(String),
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
                CellValue::DateTime(data.to_string())
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            // Whole numbers print without a fractional part
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) | CellValue::DateTime(s) | CellValue::Error(s) => f.write_str(s),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
        }
    }
}

/// First sheet of a workbook: a header row plus typed data rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Grid {
    /// Build a grid from a sheet range; the first row becomes the header.
    ///
    /// calamine trims the range to the first used cell, so leading empty
    /// rows and columns are restored to keep cells at their sheet address.
    pub fn from_range(range: &Range<Data>) -> Self {
        let (row_offset, col_offset) = range
            .start()
            .map(|(row, col)| (row as usize, col as usize))
            .unwrap_or((0, 0));
        let width = col_offset + range.width();

        let mut rows = std::iter::repeat_with(|| vec![CellValue::Empty; width])
            .take(row_offset)
            .chain(range.rows().map(|row| {
                std::iter::repeat(CellValue::Empty)
                    .take(col_offset)
                    .chain(row.iter().map(CellValue::from))
                    .collect()
            }));

        let headers = rows
            .next()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(idx, cell)| match cell {
                        CellValue::Empty => format!("Unnamed: {}", idx),
                        value => value.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            headers,
            rows: rows.collect(),
        }
    }

    /// `(data rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    pub fn cell_count(&self) -> usize {
        let (rows, cols) = self.shape();
        rows * cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// Comma-separated text with the header row first
    pub fn to_csv(&self) -> Result<String, DCompareError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        let to_err = |e: csv::Error| DCompareError::Serialization(e.to_string());
        writer.write_record(&self.headers).map_err(to_err)?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .map_err(to_err)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DCompareError::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DCompareError::Serialization(e.to_string()))
    }
}

/// Load the first sheet of a workbook
pub fn load_grid(path: &Path) -> Result<Grid, DCompareError> {
    let label = DocumentFormat::Spreadsheet.label();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| DCompareError::read(path, label, e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| DCompareError::read(path, label, e))?,
        None => return Err(DCompareError::read(path, label, "workbook has no sheets")),
    };

    Ok(Grid::from_range(&range))
}

/// A cell whose values differ between the two grids
#[derive(Debug, Clone, Serialize)]
pub struct CellDiff {
    /// Data row index (0-indexed, header excluded)
    pub row: usize,
    /// Column index (0-indexed)
    pub col: usize,
    /// Column label, taken from whichever side has the column
    pub column: String,
    /// `None` when the cell lies outside the left grid
    pub left_value: Option<CellValue>,
    /// `None` when the cell lies outside the right grid
    pub right_value: Option<CellValue>,
}

/// A header label that differs between the two grids
#[derive(Debug, Clone, Serialize)]
pub struct ColumnMismatch {
    pub col: usize,
    pub left: Option<String>,
    pub right: Option<String>,
}

/// Cell-wise comparison of two spreadsheets
#[derive(Debug, Clone, Serialize)]
pub struct SheetComparison {
    pub left_label: String,
    pub right_label: String,
    pub left_shape: (usize, usize),
    pub right_shape: (usize, usize),
    /// Row or column counts differ; only a partial comparison was possible
    pub shape_mismatch: bool,
    pub column_mismatches: Vec<ColumnMismatch>,
    /// Total number of differing cells over the union of both extents
    pub different_cells: usize,
    /// Differing cells, possibly capped
    pub cell_diffs: Vec<CellDiff>,
    /// Cells of the left grid equal to the right cell at the same position
    pub matching_cells: usize,
    /// Cell count of the left grid
    pub total_cells: usize,
    /// `matching_cells / total_cells` as a percentage, two decimals
    pub cell_similarity: f64,
}

/// Engine for comparing spreadsheet grids
pub struct SheetDiffEngine {
    max_cell_diffs: Option<usize>,
}

impl SheetDiffEngine {
    pub fn new() -> Self {
        Self {
            max_cell_diffs: None,
        }
    }

    pub fn with_max_cell_diffs(mut self, max: Option<usize>) -> Self {
        self.max_cell_diffs = max;
        self
    }

    /// Load and compare the first sheets of two workbooks
    pub fn compare_files(&self, left: &Path, right: &Path) -> Result<SheetComparison, DCompareError> {
        let left_grid = load_grid(left)?;
        let right_grid = load_grid(right)?;
        Ok(self.compare_grids(
            &left_grid,
            &right_grid,
            &left.display().to_string(),
            &right.display().to_string(),
        ))
    }

    pub fn compare_grids(
        &self,
        left: &Grid,
        right: &Grid,
        left_label: &str,
        right_label: &str,
    ) -> SheetComparison {
        let left_shape = left.shape();
        let right_shape = right.shape();

        let column_mismatches = self.compare_headers(&left.headers, &right.headers);

        let total_rows = left_shape.0.max(right_shape.0);
        let total_cols = left_shape.1.max(right_shape.1);

        let mut different_cells = 0;
        let mut cell_diffs = Vec::new();

        for row in 0..total_rows {
            for col in 0..total_cols {
                let left_cell = left.get(row, col);
                let right_cell = right.get(row, col);

                if left_cell == right_cell {
                    continue;
                }

                different_cells += 1;
                if self.max_cell_diffs.map_or(true, |max| cell_diffs.len() < max) {
                    let column = left
                        .headers
                        .get(col)
                        .or_else(|| right.headers.get(col))
                        .cloned()
                        .unwrap_or_default();
                    cell_diffs.push(CellDiff {
                        row,
                        col,
                        column,
                        left_value: left_cell.cloned(),
                        right_value: right_cell.cloned(),
                    });
                }
            }
        }

        let total_cells = left.cell_count();
        let matching_cells = left
            .rows
            .iter()
            .enumerate()
            .flat_map(|(row, cells)| cells.iter().enumerate().map(move |(col, cell)| (row, col, cell)))
            .filter(|(row, col, cell)| right.get(*row, *col) == Some(*cell))
            .count();

        let cell_similarity = if total_cells == 0 {
            if right.cell_count() == 0 {
                100.0
            } else {
                0.0
            }
        } else {
            round2(matching_cells as f64 / total_cells as f64 * 100.0)
        };

        SheetComparison {
            left_label: left_label.to_string(),
            right_label: right_label.to_string(),
            left_shape,
            right_shape,
            shape_mismatch: left_shape != right_shape,
            column_mismatches,
            different_cells,
            cell_diffs,
            matching_cells,
            total_cells,
            cell_similarity,
        }
    }

    fn compare_headers(&self, left: &[String], right: &[String]) -> Vec<ColumnMismatch> {
        (0..left.len().max(right.len()))
            .filter_map(|col| {
                let l = left.get(col);
                let r = right.get(col);
                (l != r).then(|| ColumnMismatch {
                    col,
                    left: l.cloned(),
                    right: r.cloned(),
                })
            })
            .collect()
    }
}

impl Default for SheetDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}
