//! Row structures for ODS spreadsheets.

use super::Cell;

/// A row in an ODS spreadsheet.
///
/// `cells` holds every cell up to the last one that carries content or was
/// written explicitly. A trailing run of blank cells (LibreOffice pads rows
/// to the full sheet width with one repeated cell) is kept apart as
/// `padding` so it is neither expanded in memory nor lost on save.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    /// Cells in this row
    pub cells: Vec<Cell>,
    /// Raw attributes, without `table:number-rows-repeated`
    pub(crate) attributes: Vec<(String, String)>,
    /// Trailing blank cells: template and repeat count
    pub(crate) padding: Option<(Cell, usize)>,
}

impl Row {
    /// An empty row without style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all materialized cells in the row.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get a cell by column index.
    ///
    /// Returns `None` past the last materialized cell.
    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    /// Name of the row style, if any.
    pub fn style_name(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == "table:style-name")
            .map(|(_, v)| v.as_str())
    }

    /// Get a mutable cell, materializing cells up to `col`.
    ///
    /// New cells are taken from the trailing padding first, so they keep the
    /// padding's style and the row keeps its width.
    pub fn cell_mut(&mut self, col: usize) -> &mut Cell {
        while self.cells.len() <= col {
            let cell = self.next_blank_cell();
            self.cells.push(cell);
        }
        &mut self.cells[col]
    }

    /// Total width, padding included.
    pub(crate) fn width(&self) -> usize {
        self.cells.len() + self.padding.as_ref().map_or(0, |(_, count)| *count)
    }

    /// Whether no cell of the row carries anything but a style.
    pub(crate) fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }

    fn next_blank_cell(&mut self) -> Cell {
        match self.padding.take() {
            Some((template, count)) => {
                if count > 1 {
                    self.padding = Some((template.clone(), count - 1));
                }
                template
            },
            None => Cell::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odf::ods::CellValue;

    fn styled_blank() -> Cell {
        let mut cell = Cell::empty();
        cell.attributes
            .push(("table:style-name".to_string(), "ce1".to_string()));
        cell
    }

    #[test]
    fn test_growth_consumes_padding() {
        let mut row = Row {
            cells: vec![Cell::new(CellValue::Text("a".into()))],
            attributes: Vec::new(),
            padding: Some((styled_blank(), 10)),
        };

        row.cell_mut(3).set_value(CellValue::Number(4.0));

        assert_eq!(row.cells().len(), 4);
        assert_eq!(row.width(), 11);
        assert_eq!(row.cells[2].style_name(), Some("ce1"));
        assert_eq!(row.cells[3].style_name(), Some("ce1"));
        assert_eq!(row.padding.as_ref().map(|(_, n)| *n), Some(7));
    }

    #[test]
    fn test_growth_past_padding() {
        let mut row = Row {
            cells: Vec::new(),
            attributes: Vec::new(),
            padding: Some((styled_blank(), 2)),
        };

        row.cell_mut(4);

        assert!(row.padding.is_none());
        assert_eq!(row.cells[1].style_name(), Some("ce1"));
        assert_eq!(row.cells[2].style_name(), None);
        assert!(row.is_blank());
    }
}
