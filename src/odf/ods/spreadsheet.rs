//! Main Spreadsheet structure and implementation.

use super::Sheet;
use super::parser::OdsParser;
use super::serializer::splice_sheets;
use crate::common::{Error, Result};
use crate::odf::core::Package;
use crate::odf::{ODS_MIME_TYPE, ODS_TEMPLATE_MIME_TYPE};
use std::path::Path;

/// An OpenDocument spreadsheet (.ods).
///
/// The spreadsheet keeps its whole package in memory. Saving regenerates the
/// rows of modified sheets only; every other byte of `content.xml` and every
/// other package member is written back as it was read.
///
/// # Examples
///
/// ```no_run
/// use seafform::odf::{CellValue, Spreadsheet};
///
/// # fn main() -> seafform::Result<()> {
/// let mut spreadsheet = Spreadsheet::open("form.ods")?;
///
/// if let Some(sheet) = spreadsheet.sheet_by_name_mut("Data") {
///     println!("Rows: {}, Columns: {}", sheet.row_count(), sheet.column_count());
///     sheet.set_value(4, 1, CellValue::Text("Alice".to_string()))?;
/// }
///
/// spreadsheet.save("form.ods")?;
/// # Ok(())
/// # }
/// ```
pub struct Spreadsheet {
    package: Package,
    content: String,
    sheets: Vec<Sheet>,
}

impl Spreadsheet {
    /// Open an ODS spreadsheet from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid ODS file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Create a Spreadsheet from a byte buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not represent a valid ODS file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(bytes)?;

        // Verify this is a spreadsheet
        let mime_type = package.mimetype();
        if mime_type != ODS_MIME_TYPE && mime_type != ODS_TEMPLATE_MIME_TYPE {
            return Err(Error::InvalidFormat(format!(
                "Not an ODS file: MIME type is {}",
                mime_type
            )));
        }

        let content = String::from_utf8(package.get_file("content.xml")?.to_vec())
            .map_err(|_| Error::InvalidFormat("content.xml is not valid UTF-8".to_string()))?;
        let sheets = OdsParser::parse_sheets(&content)?;

        Ok(Self {
            package,
            content,
            sheets,
        })
    }

    /// Get the number of sheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get all sheets in document order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Get the names of all sheets.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    /// Get a sheet by index.
    pub fn sheet_by_index(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Get a sheet by name.
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Get a mutable sheet by name.
    pub fn sheet_by_name_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|sheet| sheet.name == name)
    }

    /// Whether any sheet was written to.
    pub fn is_modified(&self) -> bool {
        self.sheets.iter().any(Sheet::is_modified)
    }

    /// Serialize the spreadsheet to ODS bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if !self.is_modified() {
            return self.package.to_bytes_with(&[]);
        }

        let content = splice_sheets(&self.content, &self.sheets)?;
        self.package
            .to_bytes_with(&[("content.xml", content.as_bytes())])
    }

    /// Save the spreadsheet to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}
