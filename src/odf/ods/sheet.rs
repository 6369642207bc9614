//! Sheet structures for ODS spreadsheets.

use super::{Cell, CellValue, Row};
use crate::common::{Error, Result};
use std::ops::Range;

/// Largest row count an ODS application accepts.
pub const MAX_ROWS: usize = 1_048_576;
/// Largest column count an ODS application accepts.
pub const MAX_COLUMNS: usize = 16_384;

static EMPTY_VALUE: CellValue = CellValue::Empty;

/// A sheet (worksheet) in an ODS spreadsheet.
///
/// The grid is addressed with 0-based `(row, col)` indices. Reads outside the
/// materialized rows and cells see empty cells; writes grow the grid on
/// demand.
#[derive(Clone, Debug)]
pub struct Sheet {
    /// Sheet name
    pub name: String,
    /// Rows in this sheet
    pub rows: Vec<Row>,
    /// Trailing blank rows: template and repeat count
    pub(crate) padding: Option<(Row, usize)>,
    /// Byte range of the row elements inside `content.xml`
    pub(crate) span: Option<Range<usize>>,
    /// Set once a cell was written
    pub(crate) modified: bool,
}

impl Sheet {
    /// An empty sheet that is not backed by any `content.xml`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            padding: None,
            span: None,
            modified: false,
        }
    }

    /// Get the name of the sheet.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get all rows in the sheet.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of materialized rows; trailing blank padding is not counted.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Maximum number of materialized cells across all rows.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }

    /// Whether any cell was written since the sheet was read.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Get the cell at `(row, col)`, if materialized.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cell(col))
    }

    /// Get the value at `(row, col)`; `Empty` outside the grid.
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        self.cell(row, col).map_or(&EMPTY_VALUE, Cell::value)
    }

    /// Get the displayed text at `(row, col)`; `""` outside the grid.
    pub fn text(&self, row: usize, col: usize) -> &str {
        self.cell(row, col).map_or("", Cell::text)
    }

    /// Whether the cell at `(row, col)` holds no value.
    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_none_or(Cell::is_empty)
    }

    /// Set the value at `(row, col)`, growing the grid as needed.
    pub fn set_value(&mut self, row: usize, col: usize, value: CellValue) -> Result<()> {
        if row >= MAX_ROWS || col >= MAX_COLUMNS {
            return Err(Error::InvalidFormat(format!(
                "Cell ({}, {}) is beyond the sheet limits",
                row, col
            )));
        }

        self.row_mut(row).cell_mut(col).set_value(value);
        self.modified = true;
        Ok(())
    }

    /// Get a mutable row, materializing rows up to `row` from the trailing
    /// padding first.
    fn row_mut(&mut self, row: usize) -> &mut Row {
        while self.rows.len() <= row {
            let next = self.next_blank_row();
            self.rows.push(next);
        }
        &mut self.rows[row]
    }

    fn next_blank_row(&mut self) -> Row {
        match self.padding.take() {
            Some((template, count)) => {
                if count > 1 {
                    self.padding = Some((template.clone(), count - 1));
                }
                template
            },
            None => Row::new(),
        }
    }
}
