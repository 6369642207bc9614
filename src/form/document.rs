//! A form backed by a spreadsheet in some storage.
//!
//! # Layout
//!
//! The `Data` sheet of the spreadsheet carries everything (0-based rows):
//!
//! | Cell | Content |
//! |------|---------|
//! | column A, row 6 | title |
//! | column A, row 8 | description |
//! | column A, row 10 | view mode token (`table`, `form`) |
//! | column A, row 12 | edit token (`yes`, `no`) |
//! | columns B.., rows 0-3 | field name, kind token (`*` = required), params, description |
//! | columns B.., rows 4.. | submitted rows |
//!
//! Columns whose kind cell holds no known token are annotations: they are
//! not fields and posting never touches them.

use super::{Field, FieldKind, FormValue, Values, ViewMode, Vocabulary, encode};
use crate::common::{Error, Result};
use crate::odf::{CellValue, Sheet, Spreadsheet};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

/// Number of header rows above the data rows.
pub const HEADER_ROWS: usize = 4;

/// Name of the sheet holding the form.
pub const DATA_SHEET: &str = "Data";

const TITLE_CELL: (usize, usize) = (6, 0);
const DESCRIPTION_CELL: (usize, usize) = (8, 0);
const VIEW_MODE_CELL: (usize, usize) = (10, 0);
const EDIT_CELL: (usize, usize) = (12, 0);

/// First field column; an empty cell here marks an unused row. Column A
/// cannot serve since it holds the metadata cells.
const SENTINEL_COLUMN: usize = 1;

/// Form-level properties and fields read from the header of the `Data` sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub title: String,
    pub description: String,
    pub view_mode: ViewMode,
    /// Whether submitted rows may be replaced
    pub allow_edit: bool,
    /// Declared fields, left to right
    pub fields: Vec<Field>,
}

impl FormSchema {
    /// Look a field up by label.
    pub fn field(&self, label: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.label == label)
    }
}

/// Outcome of [`FormDocument::check_freshness`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The stored file did not change since the last load
    Fresh,
    /// The stored file changed and was loaded again
    Reloaded,
}

struct Loaded {
    spreadsheet: Spreadsheet,
    schema: FormSchema,
    rows: Vec<Vec<FormValue>>,
    modified: DateTime<Utc>,
    first_empty_row: usize,
}

/// A form whose schema and rows live in a spreadsheet.
///
/// A document starts unloaded; [`load`](Self::load) reads the spreadsheet
/// and caches schema and rows. Accessors fail with [`Error::NotLoaded`]
/// until a load succeeded.
///
/// Posting is two explicit phases: [`check_freshness`](Self::check_freshness)
/// reloads when the stored file changed since the load, then
/// [`commit`](Self::commit) writes the row and replaces the stored file.
/// Two documents that both pass the freshness check before either commits
/// still race: the last writer wins.
///
/// # Examples
///
/// ```no_run
/// use seafform::form::{FormDocument, FormValue, Values};
/// use seafform::storage::LocalStorage;
///
/// # fn main() -> seafform::Result<()> {
/// let mut form = FormDocument::open(LocalStorage, "party.ods".into())?;
/// println!("{}: {} rows", form.title()?, form.data_row_count()?);
///
/// let mut values = Values::new();
/// values.insert("Name".to_string(), FormValue::from("Alice"));
/// values.insert("Coming".to_string(), FormValue::from(true));
/// let row = form.post(&values, None)?;
/// println!("{:?}", form.get_row_as_mapping(row)?);
/// # Ok(())
/// # }
/// ```
pub struct FormDocument<S: Storage> {
    storage: S,
    locator: S::Locator,
    vocabulary: Vocabulary,
    state: Option<Loaded>,
}

impl<S: Storage> FormDocument<S> {
    /// An unloaded document for the file at `locator`.
    pub fn new(storage: S, locator: S::Locator) -> Self {
        Self {
            storage,
            locator,
            vocabulary: Vocabulary::new(),
            state: None,
        }
    }

    /// Create and load a document.
    pub fn open(storage: S, locator: S::Locator) -> Result<Self> {
        let mut document = Self::new(storage, locator);
        document.load()?;
        Ok(document)
    }

    /// Use localized layout tokens. Takes effect at the next load.
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn locator(&self) -> &S::Locator {
        &self.locator
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Read the spreadsheet and cache its schema and rows.
    ///
    /// Any previous state, including uncommitted changes, is dropped first;
    /// a failed load leaves the document unloaded.
    pub fn load(&mut self) -> Result<()> {
        self.state = None;

        let stat = self.storage.stat(&self.locator)?;
        let mut bytes = Vec::new();
        self.storage
            .open_read(&self.locator)?
            .read_to_end(&mut bytes)?;

        let spreadsheet = Spreadsheet::from_bytes(&bytes)?;
        let (schema, rows, first_empty) = {
            let sheet = data_sheet(&spreadsheet)?;
            let schema = read_schema(sheet, &self.vocabulary)?;
            let first_empty = first_empty_row(sheet);
            let rows = (HEADER_ROWS..first_empty)
                .map(|row| read_row(sheet, &schema.fields, row))
                .collect::<Vec<_>>();
            (schema, rows, first_empty)
        };

        log::info!(
            "Loaded form {:?} from {:?}: {} fields, {} rows",
            schema.title,
            self.locator,
            schema.fields.len(),
            rows.len()
        );

        self.state = Some(Loaded {
            spreadsheet,
            schema,
            rows,
            modified: stat.modified,
            first_empty_row: first_empty,
        });
        Ok(())
    }

    /// Reload when the stored file changed since the last load.
    ///
    /// An unloaded document is loaded. Reloading discards every in-memory
    /// change: the stored file wins.
    pub fn check_freshness(&mut self) -> Result<Freshness> {
        let snapshot = match &self.state {
            Some(state) => state.modified,
            None => {
                self.load()?;
                return Ok(Freshness::Reloaded);
            },
        };

        let stat = self.storage.stat(&self.locator)?;
        if stat.modified == snapshot {
            return Ok(Freshness::Fresh);
        }

        log::info!(
            "{:?} changed since load ({} -> {}), reloading",
            self.locator,
            snapshot,
            stat.modified
        );
        self.load()?;
        Ok(Freshness::Reloaded)
    }

    /// Write `values` into a row and store the spreadsheet.
    ///
    /// With `replace_row` unset the values go to the first empty row;
    /// otherwise they replace the given data row, which needs a form that
    /// allows editing. Every declared field is written: fields missing from
    /// `values` or holding an unset value get their cell cleared. Labels that
    /// are not fields are ignored. No validation happens here.
    ///
    /// Returns the 0-based sheet row written. If storing fails, the
    /// in-memory state is dropped and the document must be loaded again.
    pub fn commit(&mut self, values: &Values, replace_row: Option<usize>) -> Result<usize> {
        let mut state = self.state.take().ok_or(Error::NotLoaded)?;

        let first_empty = state.first_empty_row;
        let target = match replace_row {
            None => first_empty,
            Some(_) if !state.schema.allow_edit => {
                self.state = Some(state);
                return Err(Error::EditNotAllowed);
            },
            Some(row) if row < HEADER_ROWS || row >= first_empty => {
                self.state = Some(state);
                return Err(Error::RowOutOfRange {
                    row,
                    first: HEADER_ROWS,
                    end: first_empty,
                });
            },
            Some(row) => row,
        };

        log::debug!("Writing row {} of {:?}", target, self.locator);
        let written = write_row(&mut state, values, target).and_then(|row_values| {
            let bytes = state.spreadsheet.to_bytes()?;
            self.storage.write_full(&self.locator, &bytes)?;
            Ok(row_values)
        });
        let row_values = match written {
            Ok(row_values) => row_values,
            Err(e) => {
                log::warn!(
                    "Storing {:?} failed, dropping in-memory state: {}",
                    self.locator,
                    e
                );
                return Err(e);
            },
        };

        match replace_row {
            Some(row) => state.rows[row - HEADER_ROWS] = row_values,
            None => {
                state.rows.push(row_values);
                state.first_empty_row = first_empty + 1;
            },
        }
        self.state = Some(state);
        Ok(target)
    }

    /// [`check_freshness`](Self::check_freshness) then
    /// [`commit`](Self::commit). A `replace_row` is applied to the rows as
    /// they are after a reload.
    pub fn post(&mut self, values: &Values, replace_row: Option<usize>) -> Result<usize> {
        self.check_freshness()?;
        self.commit(values, replace_row)
    }

    /// The values of a data row keyed by field label.
    ///
    /// `row` is the 0-based sheet row, as returned by [`commit`](Self::commit).
    pub fn get_row_as_mapping(&self, row: usize) -> Result<Values> {
        let state = self.state()?;
        let end = HEADER_ROWS + state.rows.len();
        if row < HEADER_ROWS || row >= end {
            return Err(Error::RowOutOfRange {
                row,
                first: HEADER_ROWS,
                end,
            });
        }

        Ok(state
            .schema
            .fields
            .iter()
            .zip(&state.rows[row - HEADER_ROWS])
            .map(|(field, value)| (field.label.clone(), value.clone()))
            .collect())
    }

    fn state(&self) -> Result<&Loaded> {
        self.state.as_ref().ok_or(Error::NotLoaded)
    }

    pub fn schema(&self) -> Result<&FormSchema> {
        Ok(&self.state()?.schema)
    }

    pub fn title(&self) -> Result<&str> {
        Ok(&self.state()?.schema.title)
    }

    pub fn description(&self) -> Result<&str> {
        Ok(&self.state()?.schema.description)
    }

    pub fn view_mode(&self) -> Result<ViewMode> {
        Ok(self.state()?.schema.view_mode)
    }

    pub fn allow_edit(&self) -> Result<bool> {
        Ok(self.state()?.schema.allow_edit)
    }

    pub fn fields(&self) -> Result<&[Field]> {
        Ok(&self.state()?.schema.fields)
    }

    /// Cached data rows, one value per field.
    pub fn rows(&self) -> Result<&[Vec<FormValue>]> {
        Ok(&self.state()?.rows)
    }

    /// Modification time of the stored file at the last load.
    pub fn modified(&self) -> Result<DateTime<Utc>> {
        Ok(self.state()?.modified)
    }

    /// The 0-based sheet row the next appended row goes to.
    pub fn first_empty_row_index(&self) -> Result<usize> {
        Ok(self.state()?.first_empty_row)
    }

    pub fn data_row_count(&self) -> Result<usize> {
        Ok(self.state()?.rows.len())
    }
}

fn data_sheet(spreadsheet: &Spreadsheet) -> Result<&Sheet> {
    spreadsheet
        .sheet_by_name(DATA_SHEET)
        .ok_or_else(|| Error::InvalidSchema(format!("no '{}' sheet", DATA_SHEET)))
}

fn read_schema(sheet: &Sheet, vocabulary: &Vocabulary) -> Result<FormSchema> {
    let text = move |(row, col): (usize, usize)| sheet.text(row, col);

    let view_token = text(VIEW_MODE_CELL);
    let view_mode = vocabulary
        .view_mode(view_token)
        .ok_or_else(|| Error::InvalidSchema(format!("unknown view mode {:?}", view_token)))?;
    let edit_token = text(EDIT_CELL);
    let allow_edit = vocabulary
        .edit(edit_token)
        .ok_or_else(|| Error::InvalidSchema(format!("unknown edit token {:?}", edit_token)))?;

    let mut fields = Vec::new();
    let mut labels = HashSet::new();
    for col in 1..sheet.column_count() {
        let kind_token = sheet.text(1, col);
        let Some(field) = Field::from_column(
            vocabulary,
            col,
            sheet.text(0, col),
            kind_token,
            sheet.text(2, col),
            sheet.text(3, col),
        ) else {
            if !kind_token.trim().is_empty() {
                log::debug!("Column {} ({:?}) is not a field", col, kind_token);
            }
            continue;
        };

        if field.label.is_empty() {
            return Err(Error::InvalidSchema(format!("field in column {} has no name", col)));
        }
        if !labels.insert(field.label.clone()) {
            return Err(Error::InvalidSchema(format!("duplicate field {:?}", field.label)));
        }
        if field.kind == FieldKind::List && field.choices.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "list field {:?} has no choices",
                field.label
            )));
        }
        fields.push(field);
    }

    Ok(FormSchema {
        title: text(TITLE_CELL).to_string(),
        description: text(DESCRIPTION_CELL).to_string(),
        view_mode,
        allow_edit,
        fields,
    })
}

/// The first row after the data rows.
///
/// Walks up from the bottom while the sentinel column is empty, then moves
/// down past any row that still has a value in some field column, so ragged
/// rows left by manual edits are never overwritten.
pub(crate) fn first_empty_row(sheet: &Sheet) -> usize {
    let nrows = sheet.row_count();
    let ncols = sheet.column_count();

    let mut row = nrows.saturating_sub(1);
    for r in (HEADER_ROWS..nrows).rev() {
        if sheet.is_empty_at(r, SENTINEL_COLUMN) {
            row = r;
        } else {
            break;
        }
    }
    row = row.max(HEADER_ROWS);

    for col in 1..ncols {
        while row < nrows && !sheet.is_empty_at(row, col) {
            row += 1;
        }
    }
    row
}

fn read_row(sheet: &Sheet, fields: &[Field], row: usize) -> Vec<FormValue> {
    fields
        .iter()
        .map(|field| field.kind.decode(sheet.value(row, field.column)))
        .collect()
}

/// Apply `values` to the grid and return the row as a fresh load would see it.
fn write_row(state: &mut Loaded, values: &Values, target: usize) -> Result<Vec<FormValue>> {
    let sheet = state
        .spreadsheet
        .sheet_by_name_mut(DATA_SHEET)
        .ok_or_else(|| Error::InvalidSchema(format!("no '{}' sheet", DATA_SHEET)))?;

    let mut row_values = Vec::with_capacity(state.schema.fields.len());
    for field in &state.schema.fields {
        match values.get(&field.label).and_then(encode) {
            Some(cell) => {
                row_values.push(field.kind.decode(&cell));
                sheet.set_value(target, field.column, cell)?;
            },
            None => {
                if !sheet.is_empty_at(target, field.column) {
                    sheet.set_value(target, field.column, CellValue::Empty)?;
                }
                row_values.push(field.kind.decode(&CellValue::Empty));
            },
        }
    }
    Ok(row_values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_with(cells: &[(usize, usize, &str)]) -> Sheet {
        let mut sheet = Sheet::new(DATA_SHEET);
        for (row, col, text) in cells {
            sheet
                .set_value(*row, *col, CellValue::Text(text.to_string()))
                .unwrap();
        }
        sheet
    }

    #[test]
    fn test_first_empty_row_of_blank_form() {
        let sheet = sheet_with(&[(0, 1, "Name"), (1, 1, "text")]);
        assert_eq!(first_empty_row(&sheet), HEADER_ROWS);
    }

    #[test]
    fn test_first_empty_row_after_data() {
        let sheet = sheet_with(&[(0, 1, "Name"), (4, 1, "a"), (5, 1, "b")]);
        assert_eq!(first_empty_row(&sheet), 6);
    }

    #[test]
    fn test_first_empty_row_with_ragged_columns() {
        // Column C runs two rows past the sentinel column.
        let sheet = sheet_with(&[(4, 1, "a"), (4, 2, "x"), (5, 2, "y"), (6, 2, "z")]);
        assert_eq!(first_empty_row(&sheet), 7);
    }

    #[test]
    fn test_first_empty_row_ignores_metadata_column() {
        let sheet = sheet_with(&[(4, 1, "a"), (6, 0, "Title"), (12, 0, "no")]);
        assert_eq!(first_empty_row(&sheet), 5);
    }

    #[test]
    fn test_first_empty_row_skips_trailing_blank_rows() {
        let mut sheet = sheet_with(&[(4, 1, "a")]);
        sheet.set_value(20, 1, CellValue::Empty).unwrap();
        assert_eq!(first_empty_row(&sheet), 5);
    }

    #[test]
    fn test_read_schema() {
        let sheet = sheet_with(&[
            (0, 1, "Name"),
            (1, 1, "text*"),
            (0, 2, "Notes"),
            (1, 2, "annotation"),
            (0, 3, "Color"),
            (1, 3, "list"),
            (2, 3, "red, blue"),
            (6, 0, "Party"),
            (10, 0, "table"),
            (12, 0, "yes"),
        ]);
        let schema = read_schema(&sheet, &Vocabulary::new()).unwrap();
        assert_eq!(schema.title, "Party");
        assert_eq!(schema.view_mode, ViewMode::Table);
        assert!(schema.allow_edit);
        let labels: Vec<_> = schema.fields.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Name", "Color"]);
        assert_eq!(schema.field("Color").unwrap().column, 3);
    }

    #[test]
    fn test_read_schema_rejects_bad_layout() {
        let base = [(10, 0, "table"), (12, 0, "no")];

        let unknown_view = sheet_with(&[(10, 0, "grid"), (12, 0, "no")]);
        assert!(matches!(
            read_schema(&unknown_view, &Vocabulary::new()),
            Err(Error::InvalidSchema(_))
        ));

        let mut cells = base.to_vec();
        cells.extend([(0, 1, "A"), (1, 1, "text"), (0, 2, "A"), (1, 2, "number")]);
        assert!(read_schema(&sheet_with(&cells), &Vocabulary::new()).is_err());

        let mut cells = base.to_vec();
        cells.extend([(0, 1, "Color"), (1, 1, "list"), (2, 1, " , ")]);
        assert!(read_schema(&sheet_with(&cells), &Vocabulary::new()).is_err());
    }
}
