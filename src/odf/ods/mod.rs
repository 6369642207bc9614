//! OpenDocument Spreadsheet (.ods) implementation.
//!
//! A cell grid over the sheets of an ODS file that can be edited in place
//! and written back without disturbing the parts of the file it does not
//! understand.

mod cell;
mod parser;
mod row;
mod serializer;
mod sheet;
mod spreadsheet;

pub use cell::{Cell, CellValue};
pub use row::Row;
pub(crate) use serializer::write_rows;
pub use sheet::{MAX_COLUMNS, MAX_ROWS, Sheet};
pub use spreadsheet::Spreadsheet;
