//! Forms backed by spreadsheets.
//!
//! A form is an ODS spreadsheet whose `Data` sheet declares the fields in
//! its header rows and stores one submission per row below them. See
//! [`FormDocument`] for the layout and the load/post cycle, [`validate`] for
//! checking user input and [`FormTemplate`] for creating new forms.

mod document;
mod field;
mod template;
mod validate;
mod value;
mod vocabulary;

pub use document::{DATA_SHEET, FormDocument, FormSchema, Freshness, HEADER_ROWS};
pub use field::{Field, FieldKind, encode, parse_choices};
pub use template::FormTemplate;
pub use validate::{FieldError, FieldErrorKind, ValidationErrors, validate};
pub use value::{FormValue, Values};
pub use vocabulary::{ViewMode, Vocabulary};
