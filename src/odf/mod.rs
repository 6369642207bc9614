//! OpenDocument Format (ODF) support.
//!
//! Just enough of ODF to back a form with a spreadsheet: the ZIP package
//! (see [`Package`] and [`PackageWriter`]) and the cell grid of OpenDocument
//! spreadsheets (see [`Spreadsheet`]).
//!
//! # Example
//!
//! ```no_run
//! use seafform::odf::Spreadsheet;
//!
//! # fn main() -> seafform::Result<()> {
//! let spreadsheet = Spreadsheet::open("form.ods")?;
//! for sheet in spreadsheet.sheets() {
//!     println!("{}: {} rows", sheet.name(), sheet.row_count());
//! }
//! # Ok(())
//! # }
//! ```

/// Core ODF package functionality
mod core;
/// ODF spreadsheet (.ods) support
pub mod ods;

pub use core::{Package, PackageEntry, PackageWriter};
pub use ods::{Cell, CellValue, Row, Sheet, Spreadsheet};

/// MIME type of OpenDocument spreadsheets
pub const ODS_MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
/// MIME type of OpenDocument spreadsheet templates
pub const ODS_TEMPLATE_MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet-template";
